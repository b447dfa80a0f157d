//! Control module: outgoing vehicle commands and their publishers
pub mod publishers;

use crate::config::CommandConfig;

/// Command sent to the vehicle once per completed cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlCommand {
    /// Longitudinal command mode understood by the vehicle interface
    pub mode: u8,
    pub velocity: f64,
    pub accel: f64,
    /// Steering angle in radians, positive to the left
    pub steering: f64,
}

/// Control stack for the vehicle.
///
/// Owns the fixed longitudinal operating point; only steering changes per cycle.
#[derive(Debug, Clone)]
pub struct ControlStack {
    config: CommandConfig,
}

impl ControlStack {
    /// Create a new control stack
    pub fn new(config: CommandConfig) -> Self {
        ControlStack { config }
    }

    /// Build the command for a steering angle
    pub fn command(&self, steering: f64) -> ControlCommand {
        let steering = if steering.is_finite() { steering } else { 0.0 };
        ControlCommand {
            mode: self.config.mode,
            velocity: self.config.velocity,
            accel: self.config.accel,
            steering,
        }
    }
}
