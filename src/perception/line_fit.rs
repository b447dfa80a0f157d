//! Robust linear fit (random sample consensus) with slope clamping
//!
//! Each side of the corridor is modelled as `y = slope * x + intercept`. A
//! minority of stray cones must not drag the line, so the fit repeatedly
//! samples minimal subsets, keeps the model with the largest consensus set and
//! refits on that set.

use crate::common::types::Point2D;
use crate::config::FitConfig;
use crate::error::FitError;
use rand::seq::index;
use rand::Rng;

/// Below this spread in x a least-squares fit is treated as degenerate
const MIN_X_SPREAD: f64 = 1e-12;

/// What a fitted line represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRole {
    Left,
    Right,
    /// Center fits are forced through the vehicle origin
    Center,
}

impl FitRole {
    fn fits_intercept(self) -> bool {
        !matches!(self, FitRole::Center)
    }
}

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    pub slope: f64,
    pub intercept: f64,
    pub through_origin: bool,
}

impl FittedLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Clamp the slope to `[-limit, limit]`, keeping the intercept
    pub fn clamped(self, limit: f64) -> Self {
        FittedLine {
            slope: self.slope.clamp(-limit, limit),
            ..self
        }
    }

    fn residual(&self, point: &Point2D) -> f64 {
        (point.y - self.predict(point.x)).abs()
    }
}

/// Ordinary least squares on `points`
fn least_squares<'a>(
    points: impl Iterator<Item = &'a Point2D> + Clone,
    fit_intercept: bool,
) -> Option<FittedLine> {
    if !fit_intercept {
        let (sxy, sxx) = points.fold((0.0, 0.0), |(sxy, sxx), p| (sxy + p.x * p.y, sxx + p.x * p.x));
        if sxx <= MIN_X_SPREAD {
            return None;
        }
        return Some(FittedLine {
            slope: sxy / sxx,
            intercept: 0.0,
            through_origin: true,
        });
    }

    let (count, sum_x, sum_y) = points
        .clone()
        .fold((0usize, 0.0, 0.0), |(n, sx, sy), p| (n + 1, sx + p.x, sy + p.y));
    if count == 0 {
        return None;
    }
    let mean_x = sum_x / count as f64;
    let mean_y = sum_y / count as f64;

    let (sxy, sxx) = points.fold((0.0, 0.0), |(sxy, sxx), p| {
        let dx = p.x - mean_x;
        (sxy + dx * (p.y - mean_y), sxx + dx * dx)
    });
    if sxx <= MIN_X_SPREAD {
        return None;
    }

    let slope = sxy / sxx;
    Some(FittedLine {
        slope,
        intercept: mean_y - slope * mean_x,
        through_origin: false,
    })
}

/// Random sample consensus line fitter
#[derive(Debug, Clone)]
pub struct RobustLineFitter {
    config: FitConfig,
}

impl RobustLineFitter {
    pub fn new(config: FitConfig) -> Self {
        RobustLineFitter { config }
    }

    /// Size of each random sample: `max(2, ratio * n)`, truncated
    pub fn min_samples(&self, n: usize) -> usize {
        ((self.config.min_sample_ratio * n as f64) as usize).max(2)
    }

    pub fn fit<R: Rng + ?Sized>(
        &self,
        points: &[Point2D],
        role: FitRole,
        rng: &mut R,
    ) -> Result<FittedLine, FitError> {
        let n = points.len();
        let sample_size = self.min_samples(n);
        if n < sample_size {
            return Err(FitError::InsufficientPoints {
                required: sample_size,
                actual: n,
            });
        }

        let fit_intercept = role.fits_intercept();
        let threshold = self.config.residual_threshold;
        let mut best_inliers: Vec<usize> = Vec::new();
        let mut best_error = f64::INFINITY;
        let mut any_model = false;

        for _ in 0..self.config.max_trials {
            let sample: Vec<Point2D> = index::sample(rng, n, sample_size)
                .iter()
                .map(|i| points[i])
                .collect();
            let Some(candidate) = least_squares(sample.iter(), fit_intercept) else {
                continue;
            };
            any_model = true;

            let inliers: Vec<usize> = (0..n)
                .filter(|&i| candidate.residual(&points[i]) <= threshold)
                .collect();
            let error: f64 = inliers.iter().map(|&i| candidate.residual(&points[i])).sum();

            if inliers.len() > best_inliers.len()
                || (inliers.len() == best_inliers.len() && error < best_error)
            {
                best_inliers = inliers;
                best_error = error;
                if best_inliers.len() == n {
                    break;
                }
            }
        }

        if !any_model {
            return Err(FitError::Degenerate);
        }
        if best_inliers.len() < sample_size {
            return Err(FitError::NoConsensus {
                trials: self.config.max_trials,
            });
        }

        least_squares(best_inliers.iter().map(|&i| &points[i]), fit_intercept)
            .map(|line| line.clamped(self.config.slope_limit))
            .ok_or(FitError::Degenerate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fitter() -> RobustLineFitter {
        RobustLineFitter::new(FitConfig::default())
    }

    fn line_points(slope: f64, intercept: f64, xs: &[f64]) -> Vec<Point2D> {
        xs.iter()
            .map(|&x| Point2D::new(x, slope * x + intercept))
            .collect()
    }

    #[test]
    fn recovers_clean_line() {
        let points = line_points(0.1, 1.5, &[0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
        let mut rng = StdRng::seed_from_u64(7);
        let line = fitter().fit(&points, FitRole::Left, &mut rng).unwrap();
        assert_relative_eq!(line.slope, 0.1, epsilon = 1e-9);
        assert_relative_eq!(line.intercept, 1.5, epsilon = 1e-9);
        assert!(!line.through_origin);
    }

    #[test]
    fn ignores_outliers() {
        let mut points = line_points(-0.05, -1.8, &[0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0]);
        points.push(Point2D::new(2.2, 0.9));
        points.push(Point2D::new(3.1, -3.5));
        let mut rng = StdRng::seed_from_u64(11);
        let line = fitter().fit(&points, FitRole::Right, &mut rng).unwrap();
        assert_relative_eq!(line.slope, -0.05, epsilon = 1e-9);
        assert_relative_eq!(line.intercept, -1.8, epsilon = 1e-9);
    }

    #[test]
    fn center_role_forces_zero_intercept() {
        let points = line_points(0.3, 0.0, &[1.0, 2.0, 3.0, 4.0]);
        let mut rng = StdRng::seed_from_u64(3);
        let line = fitter().fit(&points, FitRole::Center, &mut rng).unwrap();
        assert_eq!(line.intercept, 0.0);
        assert!(line.through_origin);
        assert_relative_eq!(line.slope, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn near_vertical_slope_is_clamped() {
        let points = vec![
            Point2D::new(1.0, 0.0),
            Point2D::new(1.001, 1.0),
            Point2D::new(1.002, 2.0),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let line = fitter().fit(&points, FitRole::Left, &mut rng).unwrap();
        assert_eq!(line.slope, 30.0);

        let falling: Vec<Point2D> = points.iter().map(|p| Point2D::new(p.x, -p.y)).collect();
        let line = fitter().fit(&falling, FitRole::Right, &mut rng).unwrap();
        assert_eq!(line.slope, -30.0);
    }

    #[test]
    fn single_point_is_insufficient() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = fitter()
            .fit(&[Point2D::new(1.0, 1.0)], FitRole::Left, &mut rng)
            .unwrap_err();
        assert_eq!(err, FitError::InsufficientPoints { required: 2, actual: 1 });
    }

    #[test]
    fn identical_x_is_degenerate() {
        let points = vec![Point2D::new(2.0, 1.0), Point2D::new(2.0, 1.5), Point2D::new(2.0, 2.0)];
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            fitter().fit(&points, FitRole::Left, &mut rng).unwrap_err(),
            FitError::Degenerate
        );
    }

    #[test]
    fn min_samples_scale_with_side_size() {
        let fitter = fitter();
        assert_eq!(fitter.min_samples(3), 2);
        assert_eq!(fitter.min_samples(15), 3);
        assert_eq!(fitter.min_samples(50), 10);
    }
}
