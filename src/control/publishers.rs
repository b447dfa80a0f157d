//! Publishers for the mandatory command and the optional debug outputs

use super::ControlCommand;
use crate::common::types::Point2D;
use crate::error::{PlannerError, Result};
use log::{debug, info};
use tokio::sync::mpsc;

/// Which debug path is being published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Left,
    Right,
    Center,
}

/// Sink for the control command
pub trait CommandPublisher: Send {
    fn publish(&mut self, command: &ControlCommand) -> Result<()>;
}

/// Sink for visualization outputs. Failures never affect the command.
pub trait DebugPublisher: Send {
    fn publish_path(&mut self, kind: PathKind, frame_id: &str, points: &[Point2D]) -> Result<()>;

    fn publish_cluster_centers(&mut self, frame_id: &str, centers: &[Point2D]) -> Result<()>;
}

/// Writes commands and debug outputs to the log
#[derive(Debug, Default)]
pub struct LogPublisher;

impl CommandPublisher for LogPublisher {
    fn publish(&mut self, command: &ControlCommand) -> Result<()> {
        info!(
            "ctrl_cmd: mode={} velocity={:.2} accel={:.2} steering={:.4} rad ({:.2} deg)",
            command.mode,
            command.velocity,
            command.accel,
            command.steering,
            command.steering.to_degrees()
        );
        Ok(())
    }
}

impl DebugPublisher for LogPublisher {
    fn publish_path(&mut self, kind: PathKind, frame_id: &str, points: &[Point2D]) -> Result<()> {
        debug!("{:?} path [{}]: {} points", kind, frame_id, points.len());
        Ok(())
    }

    fn publish_cluster_centers(&mut self, frame_id: &str, centers: &[Point2D]) -> Result<()> {
        debug!("Cluster centers [{}]: {:?}", frame_id, centers);
        Ok(())
    }
}

/// Discards debug outputs
#[derive(Debug, Default)]
pub struct NullDebugPublisher;

impl DebugPublisher for NullDebugPublisher {
    fn publish_path(&mut self, _kind: PathKind, _frame_id: &str, _points: &[Point2D]) -> Result<()> {
        Ok(())
    }

    fn publish_cluster_centers(&mut self, _frame_id: &str, _centers: &[Point2D]) -> Result<()> {
        Ok(())
    }
}

impl CommandPublisher for mpsc::UnboundedSender<ControlCommand> {
    fn publish(&mut self, command: &ControlCommand) -> Result<()> {
        self.send(*command)
            .map_err(|_| PlannerError::ChannelClosed("command"))
    }
}
