//! Cone-corridor planner core
//!
//! Turns per-frame sets of obstacle points (cones in the vehicle frame, x
//! forward, y left) into a steering command. Boundary strategies live in
//! [`perception`], center path synthesis and pure pursuit in [`navigation`],
//! the outgoing command in [`control`] and the fixed-rate loop in [`planner`].
pub mod common;
pub mod config;
pub mod control;
pub mod error;
pub mod navigation;
pub mod perception;
pub mod planner;

pub use crate::common::types::{ObstaclePoint, ObstacleSet, Point2D};
pub use crate::config::{PlannerConfig, StrategyKind};
pub use crate::control::ControlCommand;
pub use crate::error::{FitError, PlannerError, Result};
pub use crate::planner::{CycleDriver, CycleReport};
