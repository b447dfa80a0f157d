//! Centroid heading: steer along the summed obstacle vector

use super::{BoundaryEstimate, BoundaryStrategy, DirectSteering};
use crate::common::geometry::angle_between;
use crate::common::types::ObstaclePoint;
use crate::error::Result;
use log::debug;
use nalgebra::Vector2;
use std::collections::HashMap;

#[derive(Debug)]
pub struct CentroidHeadingStrategy {
    forward: Vector2<f64>,
}

impl CentroidHeadingStrategy {
    /// Sum of all obstacle position vectors
    pub fn avoidance_direction(obstacles: &[ObstaclePoint]) -> Vector2<f64> {
        obstacles
            .iter()
            .fold(Vector2::zeros(), |sum, o| sum + o.position().coords)
    }
}

impl BoundaryStrategy for CentroidHeadingStrategy {
    fn new() -> Self {
        CentroidHeadingStrategy {
            forward: Vector2::new(1.0, 0.0),
        }
    }

    fn extract(&mut self, obstacles: &[ObstaclePoint], _previous_angle: f64) -> BoundaryEstimate {
        let direction = Self::avoidance_direction(obstacles);
        let angle = angle_between(&self.forward, &direction);

        // A zero-length sum has no heading
        let steering = if angle.is_nan() {
            0.0
        } else if direction.y > 0.0 {
            angle
        } else {
            -angle
        };
        debug!("Centroid heading: direction {:?}, steering {:.3}", direction, steering);

        BoundaryEstimate::Steering(DirectSteering {
            steering,
            memory: steering,
        })
    }

    fn name(&self) -> &str {
        "CentroidHeading"
    }

    fn configure(&mut self, _params: &HashMap<String, f64>) -> Result<()> {
        Ok(())
    }
}
