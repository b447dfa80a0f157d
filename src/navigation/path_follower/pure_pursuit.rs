//! Pure Pursuit path follower implementation

use super::PathFollower;
use crate::common::geometry::norm;
use crate::common::types::Point2D;
use crate::config::{positive_param, PursuitConfig};
use crate::error::Result;
use log::debug;
use std::collections::HashMap;

/// Pure Pursuit follower operating in the vehicle frame
#[derive(Debug)]
pub struct PurePursuitFollower {
    lookahead_distance: f64,
    wheel_base: f64,
}

impl PurePursuitFollower {
    pub fn with_config(config: &PursuitConfig) -> Self {
        PurePursuitFollower {
            lookahead_distance: config.lookahead_distance,
            wheel_base: config.wheel_base,
        }
    }

    pub fn lookahead_distance(&self) -> f64 {
        self.lookahead_distance
    }

    /// First path point at or beyond the lookahead distance from the vehicle
    pub fn find_target(&self, path: &[Point2D]) -> Option<Point2D> {
        path.iter()
            .find(|p| norm(p) >= self.lookahead_distance)
            .copied()
    }

    /// Pursuit law for a target point in the vehicle frame
    pub fn steering_to(&self, target: &Point2D) -> f64 {
        let alpha = target.y.atan2(target.x);
        (2.0 * self.wheel_base * alpha.sin()).atan2(self.lookahead_distance)
    }
}

impl PathFollower for PurePursuitFollower {
    fn new() -> Self {
        Self::with_config(&PursuitConfig::default())
    }

    fn compute_steering(&self, path: &[Point2D]) -> f64 {
        match self.find_target(path) {
            Some(target) => {
                let steering = self.steering_to(&target);
                debug!(
                    "Pure Pursuit: target ({:.2}, {:.2}), steering {:.3} rad",
                    target.x, target.y, steering
                );
                steering
            }
            None => {
                debug!(
                    "Pure Pursuit: no point beyond {:.2} m on a {}-point path, driving straight",
                    self.lookahead_distance,
                    path.len()
                );
                0.0
            }
        }
    }

    fn name(&self) -> &str {
        "PurePursuitFollower"
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(lookahead) = positive_param(params, "lookahead_distance")? {
            self.lookahead_distance = lookahead;
        }

        if let Some(wheel_base) = positive_param(params, "wheel_base")? {
            self.wheel_base = wheel_base;
        }

        Ok(())
    }
}
