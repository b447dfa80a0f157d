//! Path following: turns a center path into a steering angle

use crate::common::types::Point2D;
use crate::error::Result;
use std::collections::HashMap;
use std::fmt::Debug;

/// Trait for path following algorithms
pub trait PathFollower: Debug + Send + Sync {
    /// Create a new instance with default parameters
    fn new() -> Self
    where
        Self: Sized;

    /// Compute a steering angle (radians, positive to the left) for a path
    /// given in the vehicle frame
    fn compute_steering(&self, path: &[Point2D]) -> f64;

    /// Get the name of this path follower
    fn name(&self) -> &str;

    /// Configure the path follower with parameters
    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()>;
}

pub mod pure_pursuit;

pub use pure_pursuit::PurePursuitFollower as DefaultPathFollower;
