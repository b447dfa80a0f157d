//! Navigation module: center path synthesis and path following
pub mod center_path;
pub mod path_follower;

use self::path_follower::{DefaultPathFollower, PathFollower};
use crate::common::types::{CenterPath, Point2D};
use crate::error::Result;
use crate::perception::BoundaryEstimate;
use std::collections::HashMap;

/// Navigation stack for the vehicle
#[derive(Debug)]
pub struct NavigationStack {
    path_follower: Box<dyn PathFollower>,
}

impl NavigationStack {
    /// Create a new navigation stack with the default follower
    pub fn new() -> Self {
        Self::with_path_follower(DefaultPathFollower::new())
    }

    /// Create a new navigation stack with a specific path follower
    pub fn with_path_follower<T: PathFollower + 'static>(path_follower: T) -> Self {
        NavigationStack {
            path_follower: Box::new(path_follower),
        }
    }

    /// Configure the path follower
    pub fn configure_path_follower(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        self.path_follower.configure(params)
    }

    /// Get the name of the current path follower
    pub fn path_follower_name(&self) -> &str {
        self.path_follower.name()
    }

    /// Build the center path for a boundary estimate, if it carries one
    pub fn plan_path(&self, estimate: &BoundaryEstimate) -> Option<CenterPath> {
        center_path::synthesize(estimate)
    }

    /// Steering angle that follows `path`
    pub fn follow_path(&self, path: &[Point2D]) -> f64 {
        self.path_follower.compute_steering(path)
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new()
    }
}
