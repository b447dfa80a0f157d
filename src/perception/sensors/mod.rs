//! Obstacle sources feeding the planner

use crate::common::types::{ObstaclePoint, ObstacleSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A producer of obstacle sets, one per detection message
pub trait ObstacleSource {
    /// Get the source name
    fn name(&self) -> &str;

    /// Produce the next obstacle set, or `None` once the source is exhausted
    fn next_set(&mut self) -> Option<ObstacleSet>;
}

/// Two noisy rows of cones along a gently weaving corridor.
///
/// Each call advances the vehicle along the corridor and reports the cones
/// within sensor range in the vehicle frame.
#[derive(Debug)]
pub struct SyntheticCorridor {
    half_width: f64,
    spacing: f64,
    amplitude: f64,
    wavelength: f64,
    noise: f64,
    range: f64,
    step: f64,
    travelled: f64,
    remaining: usize,
    rng: StdRng,
}

impl SyntheticCorridor {
    pub fn new(frames: usize, seed: u64) -> Self {
        SyntheticCorridor {
            half_width: 1.6,
            spacing: 1.2,
            amplitude: 0.5,
            wavelength: 6.0,
            noise: 0.05,
            range: 8.0,
            step: 0.7,
            travelled: 0.0,
            remaining: frames,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn centerline(&self, s: f64) -> f64 {
        self.amplitude * (s / self.wavelength).sin()
    }
}

impl ObstacleSource for SyntheticCorridor {
    fn name(&self) -> &str {
        "SyntheticCorridor"
    }

    fn next_set(&mut self) -> Option<ObstacleSet> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let origin = self.travelled;
        let offset = self.centerline(origin);
        let first = (origin / self.spacing).ceil() as i64;
        let count = (self.range / self.spacing) as i64;

        let mut obstacles = ObstacleSet::new();
        for k in first..first + count {
            let s = k as f64 * self.spacing;
            let center = self.centerline(s) - offset;
            for side in [1.0, -1.0] {
                let jitter_x = self.rng.gen_range(-self.noise..=self.noise);
                let jitter_y = self.rng.gen_range(-self.noise..=self.noise);
                obstacles.push(ObstaclePoint::with_radius(
                    s - origin + jitter_x,
                    center + side * self.half_width + jitter_y,
                    0.15,
                ));
            }
        }

        self.travelled += self.step;
        Some(obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::largest_detector_radius;

    #[test]
    fn produces_requested_frames() {
        let mut source = SyntheticCorridor::new(3, 1);
        assert!(source.next_set().is_some());
        assert!(source.next_set().is_some());
        assert!(source.next_set().is_some());
        assert!(source.next_set().is_none());
    }

    #[test]
    fn cones_lie_ahead_on_both_sides() {
        let mut source = SyntheticCorridor::new(1, 1);
        let set = source.next_set().unwrap();
        assert!(!set.is_empty());
        assert!(set.iter().all(|o| o.x > -0.1 && o.x < 8.1));
        assert!(set.iter().any(|o| o.y > 0.0));
        assert!(set.iter().any(|o| o.y < 0.0));
        assert_eq!(largest_detector_radius(&set), Some(0.15));
    }
}
