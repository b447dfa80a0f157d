//! Perception module: turns raw obstacle sets into corridor boundaries
pub mod angular_scan;
pub mod centroid;
pub mod chaining;
pub mod clustering;
pub mod line_fit;
pub mod sensors;

use self::angular_scan::AngularScanStrategy;
use self::centroid::CentroidHeadingStrategy;
use self::chaining::ChainingStrategy;
use self::clustering::ClusteringStrategy;
use self::line_fit::FittedLine;
use crate::common::types::{BoundaryChain, ObstaclePoint, Point2D};
use crate::config::{PlannerConfig, StrategyKind};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt::Debug;

/// Trait for boundary extraction strategies
pub trait BoundaryStrategy: Debug + Send {
    /// Create a new instance with default parameters
    fn new() -> Self
    where
        Self: Sized;

    /// Run one extraction pass over the current obstacle set.
    ///
    /// `previous_angle` is the hysteresis scalar carried by the cycle driver;
    /// strategies that do not need it ignore it.
    fn extract(&mut self, obstacles: &[ObstaclePoint], previous_angle: f64) -> BoundaryEstimate;

    /// Get the name of this strategy
    fn name(&self) -> &str;

    /// Override parameters at runtime
    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()>;
}

/// Output of one boundary extraction pass
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryEstimate {
    /// Independently sized chains; either side may be empty
    Chains {
        left: BoundaryChain,
        right: BoundaryChain,
    },
    /// Both sides fitted and sampled at the same x positions
    Fitted(FittedBoundaries),
    /// The strategy steers directly and bypasses path synthesis
    Steering(DirectSteering),
    /// Fitting gave up this cycle; the previously issued command stays in effect
    NoFit,
}

/// Left and right fitted lines evaluated on a shared x grid
#[derive(Debug, Clone, PartialEq)]
pub struct FittedBoundaries {
    pub samples_x: Vec<f64>,
    pub left_y: Vec<f64>,
    pub right_y: Vec<f64>,
    pub left_line: FittedLine,
    pub right_line: FittedLine,
    /// Validated cluster centers, left first
    pub centers: [Point2D; 2],
    /// Corridor heading through the vehicle origin, fitted on the midpoints;
    /// `None` when that fit fails (the boundaries stay usable)
    pub center_line: Option<FittedLine>,
}

impl FittedBoundaries {
    pub fn left_chain(&self) -> BoundaryChain {
        zip_points(&self.samples_x, &self.left_y)
    }

    pub fn right_chain(&self) -> BoundaryChain {
        zip_points(&self.samples_x, &self.right_y)
    }
}

fn zip_points(xs: &[f64], ys: &[f64]) -> BoundaryChain {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| Point2D::new(x, y))
        .collect()
}

/// Steering produced without a center path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectSteering {
    /// Steering angle in radians, positive to the left
    pub steering: f64,
    /// Value to carry into the next cycle as the hysteresis scalar
    pub memory: f64,
}

/// Build the strategy selected in the config
pub fn strategy_from_config(config: &PlannerConfig) -> Box<dyn BoundaryStrategy> {
    match config.strategy {
        StrategyKind::AngularScan => Box::new(AngularScanStrategy::with_config(config.scan.clone())),
        StrategyKind::Chaining => Box::new(ChainingStrategy::with_config(config.chaining.clone())),
        StrategyKind::Clustering => {
            Box::new(ClusteringStrategy::with_config(config.clustering.clone()))
        }
        StrategyKind::CentroidHeading => Box::new(CentroidHeadingStrategy::new()),
    }
}
