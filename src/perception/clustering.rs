//! Two-means clustering of the obstacle set followed by a robust fit per side
//!
//! The obstacle set is split into two clusters whose centers must each fall
//! into a plausible corridor band (one to the left, one to the right of the
//! vehicle). Invalid splits are retried with fresh random initialisation up
//! to a fixed attempt budget. Each validated side is then fitted with
//! [`RobustLineFitter`] and sampled on a shared x grid.

use super::line_fit::{FitRole, FittedLine, RobustLineFitter};
use super::{BoundaryEstimate, BoundaryStrategy, FittedBoundaries};
use crate::common::geometry::distance;
use crate::common::types::{BoundaryChain, ObstaclePoint, Point2D};
use crate::config::{positive_param, ClusteringConfig};
use crate::error::Result;
use log::{debug, warn};
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Result of a single two-means run
#[derive(Debug, Clone, PartialEq)]
pub struct TwoMeans {
    pub centers: [Point2D; 2],
    /// Cluster index (0 or 1) for every input point
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centers
    pub inertia: f64,
}

impl TwoMeans {
    /// Points assigned to `cluster`
    pub fn members(&self, points: &[Point2D], cluster: usize) -> Vec<Point2D> {
        points
            .iter()
            .zip(&self.labels)
            .filter(|(_, &label)| label == cluster)
            .map(|(p, _)| *p)
            .collect()
    }
}

/// Outcome of the bounded cluster search
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterSearch {
    Found { clusters: TwoMeans, attempts: usize },
    Exhausted { attempts: usize },
}

/// Two-means over `points`, best of `restarts` k-means++ initialisations
pub fn two_means<R: Rng + ?Sized>(
    points: &[Point2D],
    restarts: usize,
    max_iterations: usize,
    rng: &mut R,
) -> Option<TwoMeans> {
    if points.len() < 2 {
        return None;
    }

    (0..restarts.max(1))
        .map(|_| {
            let seeds = seed_centers(points, rng);
            lloyd(points, seeds, max_iterations)
        })
        .min_by(|a, b| a.inertia.total_cmp(&b.inertia))
}

/// k-means++ seeding for two clusters
fn seed_centers<R: Rng + ?Sized>(points: &[Point2D], rng: &mut R) -> [Point2D; 2] {
    let first = points[rng.gen_range(0..points.len())];
    let weights: Vec<f64> = points
        .iter()
        .map(|p| distance(p, &first).powi(2))
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return [first, first];
    }

    let mut target = rng.gen::<f64>() * total;
    for (point, weight) in points.iter().zip(&weights) {
        if target < *weight {
            return [first, *point];
        }
        target -= weight;
    }
    [first, points[points.len() - 1]]
}

fn nearest_center(point: &Point2D, centers: &[Point2D; 2]) -> usize {
    if distance(point, &centers[1]) < distance(point, &centers[0]) {
        1
    } else {
        0
    }
}

fn lloyd(points: &[Point2D], mut centers: [Point2D; 2], max_iterations: usize) -> TwoMeans {
    let mut labels: Vec<usize> = points.iter().map(|p| nearest_center(p, &centers)).collect();

    for _ in 0..max_iterations {
        for (cluster, center) in centers.iter_mut().enumerate() {
            let (sum, count) = points
                .iter()
                .zip(&labels)
                .filter(|(_, &label)| label == cluster)
                .fold((Vector2::<f64>::zeros(), 0usize), |(sum, count), (p, _)| {
                    (sum + p.coords, count + 1)
                });
            // An emptied cluster keeps its previous center
            if count > 0 {
                *center = Point2D::from(sum / count as f64);
            }
        }

        let next: Vec<usize> = points.iter().map(|p| nearest_center(p, &centers)).collect();
        if next == labels {
            break;
        }
        labels = next;
    }

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &label)| distance(p, &centers[label]).powi(2))
        .sum();

    TwoMeans {
        centers,
        labels,
        inertia,
    }
}

/// `count` evenly spaced values from `min` to `max` inclusive
pub fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    let intervals = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| min + (max - min) * i as f64 / intervals)
        .collect()
}

#[derive(Debug)]
pub struct ClusteringStrategy {
    config: ClusteringConfig,
    fitter: RobustLineFitter,
    rng: StdRng,
}

impl ClusteringStrategy {
    pub fn with_config(config: ClusteringConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ClusteringStrategy {
            fitter: RobustLineFitter::new(config.fit.clone()),
            config,
            rng,
        }
    }

    /// Both centers inside the corridor window, exactly one on each side
    pub fn validate_centers(&self, centers: &[Point2D; 2]) -> bool {
        let mut left_count = 0;
        for center in centers {
            if center.y > 0.0 {
                left_count += 1;
            }
            let in_range = self.config.min_center_x < center.x && center.x < self.config.max_center_x;
            let lateral = center.y.abs();
            let in_band = self.config.band_inner < lateral && lateral < self.config.band_outer;
            if !(in_range && in_band) {
                return false;
            }
        }
        left_count == 1
    }

    /// Retry two-means until a split validates or the attempt budget runs out
    pub fn search(&mut self, points: &[Point2D]) -> ClusterSearch {
        for attempt in 1..=self.config.max_attempts {
            let Some(clusters) = two_means(
                points,
                self.config.kmeans_restarts,
                self.config.kmeans_max_iterations,
                &mut self.rng,
            ) else {
                break;
            };

            if self.validate_centers(&clusters.centers) {
                debug!(
                    "Valid clusters after {} attempt(s): {:?}",
                    attempt, clusters.centers
                );
                return ClusterSearch::Found {
                    clusters,
                    attempts: attempt,
                };
            }
            debug!("Cluster centers {:?} rejected, attempt {}", clusters.centers, attempt);
        }

        ClusterSearch::Exhausted {
            attempts: self.config.max_attempts,
        }
    }

    fn fit_sides(&mut self, points: &[Point2D], clusters: &TwoMeans) -> Option<FittedBoundaries> {
        let (left, right) = if clusters.centers[0].y < clusters.centers[1].y {
            (1, 0)
        } else {
            (0, 1)
        };
        let left_data = clusters.members(points, left);
        let right_data = clusters.members(points, right);

        let left_line = match self.fitter.fit(&left_data, FitRole::Left, &mut self.rng) {
            Ok(line) => line,
            Err(e) => {
                warn!("Left boundary fit failed: {}", e);
                return None;
            }
        };
        let right_line = match self.fitter.fit(&right_data, FitRole::Right, &mut self.rng) {
            Ok(line) => line,
            Err(e) => {
                warn!("Right boundary fit failed: {}", e);
                return None;
            }
        };

        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let samples_x = linspace(min_x, max_x, self.config.path_samples);
        let left_y: Vec<f64> = samples_x.iter().map(|&x| left_line.predict(x)).collect();
        let right_y: Vec<f64> = samples_x.iter().map(|&x| right_line.predict(x)).collect();
        let center_line = self.fit_heading(&samples_x, &left_y, &right_y);

        Some(FittedBoundaries {
            left_y,
            right_y,
            samples_x,
            left_line,
            right_line,
            centers: [clusters.centers[left], clusters.centers[right]],
            center_line,
        })
    }

    /// Through-origin line over the sampled midpoints
    fn fit_heading(&mut self, xs: &[f64], left_y: &[f64], right_y: &[f64]) -> Option<FittedLine> {
        let midpoints: Vec<Point2D> = xs
            .iter()
            .zip(left_y.iter().zip(right_y))
            .map(|(&x, (&l, &r))| Point2D::new(x, (l + r) / 2.0))
            .collect();

        match self.fitter.fit(&midpoints, FitRole::Center, &mut self.rng) {
            Ok(line) => {
                debug!(
                    "Corridor heading {:.2} deg (center slope {:.4})",
                    line.slope.atan().to_degrees(),
                    line.slope
                );
                Some(line)
            }
            Err(e) => {
                debug!("Center heading fit skipped: {}", e);
                None
            }
        }
    }
}

impl BoundaryStrategy for ClusteringStrategy {
    fn new() -> Self {
        Self::with_config(ClusteringConfig::default())
    }

    fn extract(&mut self, obstacles: &[ObstaclePoint], _previous_angle: f64) -> BoundaryEstimate {
        if obstacles.len() < 2 {
            return BoundaryEstimate::Chains {
                left: BoundaryChain::new(),
                right: BoundaryChain::new(),
            };
        }

        let points: Vec<Point2D> = obstacles.iter().map(ObstaclePoint::position).collect();
        match self.search(&points) {
            ClusterSearch::Found { clusters, .. } => match self.fit_sides(&points, &clusters) {
                Some(fitted) => BoundaryEstimate::Fitted(fitted),
                None => BoundaryEstimate::NoFit,
            },
            ClusterSearch::Exhausted { attempts } => {
                warn!(
                    "Failed to find valid clusters within {} attempts",
                    attempts
                );
                BoundaryEstimate::NoFit
            }
        }
    }

    fn name(&self) -> &str {
        "Clustering"
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(attempts) = positive_param(params, "max_attempts")? {
            self.config.max_attempts = attempts as usize;
        }
        if let Some(max_x) = positive_param(params, "max_center_x")? {
            self.config.max_center_x = max_x;
        }
        if let Some(outer) = positive_param(params, "band_outer")? {
            self.config.band_outer = outer;
        }
        if let Some(&inner) = params.get("band_inner") {
            self.config.band_inner = inner;
        }
        if let Some(threshold) = positive_param(params, "residual_threshold")? {
            self.config.fit.residual_threshold = threshold;
        }
        if let Some(trials) = positive_param(params, "max_trials")? {
            self.config.fit.max_trials = trials as usize;
        }
        if let Some(limit) = positive_param(params, "slope_limit")? {
            self.config.fit.slope_limit = limit;
        }
        if let Some(&seed) = params.get("seed") {
            self.rng = StdRng::seed_from_u64(seed as u64);
        }
        self.config.validate()?;
        self.fitter = RobustLineFitter::new(self.config.fit.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded() -> ClusteringStrategy {
        ClusteringStrategy::with_config(ClusteringConfig {
            seed: Some(42),
            ..ClusteringConfig::default()
        })
    }

    fn corridor() -> Vec<ObstaclePoint> {
        let xs = [0.5, 1.0, 1.5, 2.0, 2.5];
        xs.iter()
            .map(|&x| ObstaclePoint::new(x, 1.475 + 0.05 * x))
            .chain(xs.iter().map(|&x| ObstaclePoint::new(x, -1.5 - 0.02 * x)))
            .collect()
    }

    #[test]
    fn accepts_one_center_per_band() {
        let strategy = seeded();
        assert!(strategy.validate_centers(&[Point2D::new(1.5, 2.0), Point2D::new(1.2, -1.8)]));
    }

    #[test]
    fn rejects_centers_on_same_side() {
        let strategy = seeded();
        assert!(!strategy.validate_centers(&[Point2D::new(1.5, 2.0), Point2D::new(1.2, 1.8)]));
    }

    #[test]
    fn rejects_centers_outside_window() {
        let strategy = seeded();
        assert!(!strategy.validate_centers(&[Point2D::new(3.5, 2.0), Point2D::new(1.2, -1.8)]));
        assert!(!strategy.validate_centers(&[Point2D::new(1.5, 0.5), Point2D::new(1.2, -1.8)]));
        assert!(!strategy.validate_centers(&[Point2D::new(-0.5, 2.0), Point2D::new(1.2, -1.8)]));
    }

    #[test]
    fn two_means_splits_rows() {
        let points: Vec<Point2D> = corridor().iter().map(ObstaclePoint::position).collect();
        let mut rng = StdRng::seed_from_u64(9);
        let clusters = two_means(&points, 10, 300, &mut rng).unwrap();
        let (upper, lower) = if clusters.centers[0].y > 0.0 { (0, 1) } else { (1, 0) };
        assert_eq!(clusters.members(&points, upper).len(), 5);
        assert_eq!(clusters.members(&points, lower).len(), 5);
        assert_relative_eq!(clusters.centers[upper].x, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn two_means_needs_two_points() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!(two_means(&[Point2D::new(1.0, 1.0)], 10, 300, &mut rng).is_none());
    }

    #[test]
    fn fits_both_sides_on_shared_grid() {
        let mut strategy = seeded();
        let BoundaryEstimate::Fitted(fitted) = strategy.extract(&corridor(), 0.0) else {
            panic!("expected fitted boundaries");
        };
        assert_eq!(fitted.samples_x.len(), 30);
        assert_relative_eq!(fitted.samples_x[0], 0.5);
        assert_relative_eq!(fitted.samples_x[29], 2.5, epsilon = 1e-12);
        assert_relative_eq!(fitted.left_line.slope, 0.05, epsilon = 1e-9);
        assert_relative_eq!(fitted.right_line.intercept, -1.5, epsilon = 1e-9);
        assert!(fitted.left_y.iter().all(|&y| y > 1.0));
        assert!(fitted.right_y.iter().all(|&y| y < -1.0));
        assert!(fitted.centers[0].y > 0.0 && fitted.centers[1].y < 0.0);
    }

    #[test]
    fn heading_line_passes_through_origin() {
        let mut strategy = seeded();
        let BoundaryEstimate::Fitted(fitted) = strategy.extract(&corridor(), 0.0) else {
            panic!("expected fitted boundaries");
        };
        let heading = fitted.center_line.expect("midpoints lie on a near-flat line");
        assert!(heading.through_origin);
        assert_eq!(heading.intercept, 0.0);
        // Midpoints follow y = 0.015x - 0.0125
        assert!(heading.slope.abs() < 0.05);
    }

    #[test]
    fn one_sided_obstacles_exhaust_search() {
        let mut strategy = seeded();
        let obstacles: Vec<ObstaclePoint> = [(0.5, 1.5), (1.0, 1.6), (2.0, 2.5), (2.5, 2.6)]
            .iter()
            .map(|&(x, y)| ObstaclePoint::new(x, y))
            .collect();
        let points: Vec<Point2D> = obstacles.iter().map(ObstaclePoint::position).collect();
        assert_eq!(strategy.search(&points), ClusterSearch::Exhausted { attempts: 10 });
        assert_eq!(strategy.extract(&obstacles, 0.0), BoundaryEstimate::NoFit);
    }

    #[test]
    fn lone_cone_side_cannot_be_fitted() {
        let mut strategy = seeded();
        let obstacles: Vec<ObstaclePoint> = [(0.5, 1.5), (1.0, 1.5), (1.5, 1.6), (2.0, 1.6), (1.5, -1.5)]
            .iter()
            .map(|&(x, y)| ObstaclePoint::new(x, y))
            .collect();
        assert_eq!(strategy.extract(&obstacles, 0.0), BoundaryEstimate::NoFit);
    }

    #[test]
    fn linspace_includes_both_ends() {
        let xs = linspace(1.0, 2.0, 3);
        assert_eq!(xs, vec![1.0, 1.5, 2.0]);
    }
}
