//! Error types for the corridor planner

use thiserror::Error;

/// Errors surfaced by configuration and the driver loop
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("{0} channel closed")]
    ChannelClosed(&'static str),
}

impl PlannerError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        PlannerError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Reasons a robust line fit can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("insufficient points: required {required}, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    #[error("no consensus set found after {trials} trials")]
    NoConsensus { trials: usize },

    #[error("degenerate sample: all x values coincide")]
    Degenerate,
}

pub type Result<T> = std::result::Result<T, PlannerError>;
