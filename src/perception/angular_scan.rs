//! Clearance-maximizing angular scan
//!
//! Casts a ray for every scan degree, measures how far each ray travels before
//! touching an inflated obstacle and steers toward the clearest one. This
//! strategy skips boundary chains and center path synthesis entirely.

use super::{BoundaryEstimate, BoundaryStrategy, DirectSteering};
use crate::common::geometry::{line_circle_intersection, norm};
use crate::common::types::ObstaclePoint;
use crate::config::{positive_param, ScanConfig};
use crate::error::Result;
use log::debug;
use std::collections::HashMap;

#[derive(Debug)]
pub struct AngularScanStrategy {
    config: ScanConfig,
}

/// The ray that won a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWinner {
    pub degree: i32,
    pub clearance: f64,
}

impl AngularScanStrategy {
    pub fn with_config(config: ScanConfig) -> Self {
        AngularScanStrategy { config }
    }

    /// Free distance along the ray at `degree` before it enters any obstacle disk
    pub fn clearance(&self, obstacles: &[ObstaclePoint], degree: i32) -> f64 {
        let slope = f64::from(degree).to_radians().tan();
        obstacles
            .iter()
            .filter_map(|obstacle| {
                line_circle_intersection(slope, &obstacle.position(), self.config.obstacle_radius)
            })
            .map(|hit| norm(&hit))
            .fold(self.config.default_clearance, f64::min)
    }

    /// Pick the ray with the largest clearance.
    ///
    /// Exact ties go to the degree closest to `previous_degree`; among equally
    /// close candidates the one scanned first is kept.
    pub fn scan(&self, obstacles: &[ObstaclePoint], previous_degree: f64) -> ScanWinner {
        let mut best = ScanWinner {
            degree: 0,
            clearance: 0.0,
        };

        let step = self.config.step_degree.max(1) as usize;
        for degree in (self.config.min_degree..=self.config.max_degree).step_by(step) {
            let clearance = self.clearance(obstacles, degree);
            if clearance > best.clearance {
                best = ScanWinner { degree, clearance };
            } else if clearance == best.clearance {
                let candidate_gap = (previous_degree - f64::from(degree)).abs();
                let best_gap = (previous_degree - f64::from(best.degree)).abs();
                if candidate_gap < best_gap {
                    best = ScanWinner { degree, clearance };
                }
            }
        }

        best
    }

    /// Steering angle in degrees for a scan degree
    pub fn steering_degrees(&self, degree: i32) -> f64 {
        f64::from(degree) * self.config.steering_scale
    }

    /// Convert a scan degree into a steering angle in radians
    pub fn steering_for(&self, degree: i32) -> f64 {
        self.steering_degrees(degree).to_radians()
    }
}

impl BoundaryStrategy for AngularScanStrategy {
    fn new() -> Self {
        Self::with_config(ScanConfig::default())
    }

    fn extract(&mut self, obstacles: &[ObstaclePoint], previous_angle: f64) -> BoundaryEstimate {
        let winner = self.scan(obstacles, previous_angle);
        let steering = self.steering_for(winner.degree);
        debug!(
            "Angular scan: best ray {} deg with clearance {:.2}, steering {:.3} rad",
            winner.degree, winner.clearance, steering
        );

        // Memory is the steering angle in degrees, compared against scan
        // degrees next cycle; an open road decays toward straight
        BoundaryEstimate::Steering(DirectSteering {
            steering,
            memory: self.steering_degrees(winner.degree),
        })
    }

    fn name(&self) -> &str {
        "AngularScan"
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(radius) = positive_param(params, "obstacle_radius")? {
            self.config.obstacle_radius = radius;
        }
        if let Some(clearance) = positive_param(params, "default_clearance")? {
            self.config.default_clearance = clearance;
        }
        if let Some(scale) = positive_param(params, "steering_scale")? {
            self.config.steering_scale = scale;
        }
        if let Some(&min_degree) = params.get("min_degree") {
            self.config.min_degree = min_degree as i32;
        }
        if let Some(&max_degree) = params.get("max_degree") {
            self.config.max_degree = max_degree as i32;
        }
        if let Some(step) = positive_param(params, "step_degree")? {
            self.config.step_degree = step as i32;
        }
        self.config.validate()
    }
}
