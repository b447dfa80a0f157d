//! Cycle driver: runs the obstacle-to-steering pipeline once per tick
//!
//! Obstacle messages only replace the buffered set and mark it dirty. Each
//! tick checks the flag; if new data arrived, the full pipeline runs
//! (boundaries, center path, steering) and the resulting command is handed to
//! the command publisher. Ticks without new data do nothing.

use crate::common::types::{
    largest_detector_radius, BoundaryChain, CenterPath, ObstaclePoint, ObstacleSet, Point2D,
};
use crate::config::PlannerConfig;
use crate::control::publishers::{CommandPublisher, DebugPublisher, PathKind};
use crate::control::{ControlCommand, ControlStack};
use crate::error::{PlannerError, Result};
use crate::navigation::path_follower::pure_pursuit::PurePursuitFollower;
use crate::navigation::NavigationStack;
use crate::perception::{strategy_from_config, BoundaryEstimate, BoundaryStrategy};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};

/// State carried from one tick to the next
#[derive(Debug, Clone, Default)]
pub struct CycleContext {
    latest: ObstacleSet,
    dirty: bool,
    previous_angle: f64,
}

impl CycleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffered obstacle set wholesale and mark it dirty
    pub fn on_obstacles(&mut self, obstacles: ObstacleSet) {
        self.latest = obstacles;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Hysteresis scalar from the last direct-steering cycle
    pub fn previous_angle(&self) -> f64 {
        self.previous_angle
    }

    pub fn latest(&self) -> &[ObstaclePoint] {
        &self.latest
    }
}

/// What a cycle decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Issue a command with this steering angle (radians)
    Steer(f64),
    /// No update this cycle; the last issued command stays in effect
    Hold,
}

/// Everything one cycle produced
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub left: BoundaryChain,
    pub right: BoundaryChain,
    pub center: CenterPath,
    /// Validated cluster centers (left first), clustering strategy only
    pub cluster_centers: Option<[Point2D; 2]>,
}

impl CycleReport {
    pub fn steering(&self) -> Option<f64> {
        match self.outcome {
            CycleOutcome::Steer(steering) => Some(steering),
            CycleOutcome::Hold => None,
        }
    }
}

/// Owns the pipeline and the cross-cycle context
#[derive(Debug)]
pub struct CycleDriver {
    strategy: Box<dyn BoundaryStrategy>,
    navigation: NavigationStack,
    control: ControlStack,
    context: CycleContext,
    frame_id: String,
}

impl CycleDriver {
    pub fn new(
        strategy: Box<dyn BoundaryStrategy>,
        navigation: NavigationStack,
        control: ControlStack,
        frame_id: &str,
    ) -> Self {
        CycleDriver {
            strategy,
            navigation,
            control,
            context: CycleContext::new(),
            frame_id: frame_id.to_string(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            strategy_from_config(config),
            NavigationStack::with_path_follower(PurePursuitFollower::with_config(&config.pursuit)),
            ControlStack::new(config.command.clone()),
            &config.frame_id,
        )
    }

    pub fn strategy_mut(&mut self) -> &mut dyn BoundaryStrategy {
        self.strategy.as_mut()
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationStack {
        &mut self.navigation
    }

    pub fn context(&self) -> &CycleContext {
        &self.context
    }

    /// Buffer a newly received obstacle set
    pub fn on_obstacles(&mut self, obstacles: ObstacleSet) {
        self.context.on_obstacles(obstacles);
    }

    /// Run the full pipeline on `obstacles`
    pub fn run_cycle(&mut self, obstacles: &[ObstaclePoint]) -> CycleReport {
        let estimate = self
            .strategy
            .extract(obstacles, self.context.previous_angle);

        let mut report = CycleReport {
            outcome: CycleOutcome::Hold,
            left: BoundaryChain::new(),
            right: BoundaryChain::new(),
            center: CenterPath::new(),
            cluster_centers: None,
        };

        match &estimate {
            BoundaryEstimate::Steering(direct) => {
                self.context.previous_angle = direct.memory;
                report.outcome = CycleOutcome::Steer(direct.steering);
                return report;
            }
            BoundaryEstimate::NoFit => return report,
            BoundaryEstimate::Chains { left, right } => {
                report.left = left.clone();
                report.right = right.clone();
            }
            BoundaryEstimate::Fitted(fitted) => {
                report.left = fitted.left_chain();
                report.right = fitted.right_chain();
                report.cluster_centers = Some(fitted.centers);
            }
        }

        report.center = self.navigation.plan_path(&estimate).unwrap_or_default();
        report.outcome = CycleOutcome::Steer(self.navigation.follow_path(&report.center));
        report
    }

    /// Run a cycle if new obstacles arrived since the last tick
    pub fn tick(&mut self) -> Option<CycleReport> {
        if !self.context.dirty {
            return None;
        }
        self.context.dirty = false;

        let obstacles = std::mem::take(&mut self.context.latest);
        let report = self.run_cycle(&obstacles);
        self.context.latest = obstacles;

        debug!(
            "{} cycle: {} obstacles (detector radius {:?}), left {} / right {} / center {} -> {:?}",
            self.strategy.name(),
            self.context.latest.len(),
            largest_detector_radius(&self.context.latest),
            report.left.len(),
            report.right.len(),
            report.center.len(),
            report.outcome
        );
        Some(report)
    }

    /// Tick, then publish the command and best-effort debug outputs
    pub fn tick_and_publish(
        &mut self,
        commands: &mut dyn CommandPublisher,
        debug_out: &mut dyn DebugPublisher,
    ) -> Option<ControlCommand> {
        let report = self.tick()?;

        let command = report.steering().map(|steering| self.control.command(steering));
        if let Some(command) = &command {
            if let Err(e) = commands.publish(command) {
                error!("Failed to publish control command: {}", e);
            }
        }

        self.publish_debug(&report, debug_out);
        command
    }

    fn publish_debug(&self, report: &CycleReport, debug_out: &mut dyn DebugPublisher) {
        let frame = self.frame_id.as_str();
        let results = [
            debug_out.publish_path(PathKind::Left, frame, &report.left),
            debug_out.publish_path(PathKind::Right, frame, &report.right),
            debug_out.publish_path(PathKind::Center, frame, &report.center),
        ];
        for result in results {
            if let Err(e) = result {
                warn!("Debug path publish failed: {}", e);
            }
        }

        if let Some(centers) = &report.cluster_centers {
            if let Err(e) = debug_out.publish_cluster_centers(frame, centers) {
                warn!("Cluster center publish failed: {}", e);
            }
        }
    }
}

/// Drive `driver` at a fixed rate until shutdown or until the obstacle stream ends.
///
/// When the obstacle channel closes, one final tick processes any pending set
/// before returning.
pub async fn run<C, D>(
    mut driver: CycleDriver,
    mut obstacles: mpsc::Receiver<ObstacleSet>,
    mut commands: C,
    mut debug_out: D,
    mut shutdown: watch::Receiver<bool>,
    tick_period: Duration,
) -> Result<CycleDriver>
where
    C: CommandPublisher,
    D: DebugPublisher,
{
    if tick_period.is_zero() {
        return Err(PlannerError::invalid("tick_rate_hz", "tick period must be non-zero"));
    }

    info!(
        "Planner loop started: strategy={}, follower={}, period={:?}",
        driver.strategy.name(),
        driver.navigation.path_follower_name(),
        tick_period
    );
    let mut ticker = time::interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                driver.tick_and_publish(&mut commands, &mut debug_out);
            }
            received = obstacles.recv() => match received {
                Some(set) => driver.on_obstacles(set),
                None => {
                    info!("Obstacle stream closed, stopping planner loop");
                    driver.tick_and_publish(&mut commands, &mut debug_out);
                    return Ok(driver);
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown requested, stopping planner loop");
                    return Ok(driver);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use approx::assert_relative_eq;

    fn cones(points: &[(f64, f64)]) -> ObstacleSet {
        points.iter().map(|&(x, y)| ObstaclePoint::new(x, y)).collect()
    }

    #[derive(Default)]
    struct Recorder {
        commands: Vec<ControlCommand>,
        paths: Vec<(PathKind, usize)>,
    }

    impl CommandPublisher for Recorder {
        fn publish(&mut self, command: &ControlCommand) -> Result<()> {
            self.commands.push(*command);
            Ok(())
        }
    }

    impl DebugPublisher for Recorder {
        fn publish_path(&mut self, kind: PathKind, _frame_id: &str, points: &[Point2D]) -> Result<()> {
            self.paths.push((kind, points.len()));
            Ok(())
        }

        fn publish_cluster_centers(&mut self, _frame_id: &str, _centers: &[Point2D]) -> Result<()> {
            Ok(())
        }
    }

    struct FailingDebug;

    impl DebugPublisher for FailingDebug {
        fn publish_path(&mut self, _kind: PathKind, _frame_id: &str, _points: &[Point2D]) -> Result<()> {
            Err(PlannerError::ChannelClosed("debug"))
        }

        fn publish_cluster_centers(&mut self, _frame_id: &str, _centers: &[Point2D]) -> Result<()> {
            Err(PlannerError::ChannelClosed("debug"))
        }
    }

    #[test]
    fn tick_without_new_data_is_a_no_op() {
        let mut driver = CycleDriver::from_config(&PlannerConfig::default());
        assert!(driver.tick().is_none());

        driver.on_obstacles(cones(&[(1.0, 1.0), (1.0, -1.0)]));
        assert!(driver.tick().is_some());
        assert!(driver.tick().is_none());
    }

    #[test]
    fn newest_set_replaces_pending_one() {
        let mut driver = CycleDriver::from_config(&PlannerConfig::default());
        driver.on_obstacles(cones(&[(1.0, 1.0), (1.0, -1.0)]));
        driver.on_obstacles(cones(&[(1.0, 1.0), (2.0, 1.2), (1.0, -1.0), (2.0, -1.1)]));
        let report = driver.tick().unwrap();
        assert_eq!(report.left.len(), 2);
        assert_eq!(driver.context().latest().len(), 4);
    }

    #[test]
    fn empty_set_steers_straight() {
        let mut driver = CycleDriver::from_config(&PlannerConfig::default());
        driver.on_obstacles(ObstacleSet::new());
        let report = driver.tick().unwrap();
        assert_eq!(report.outcome, CycleOutcome::Steer(0.0));
        assert!(report.left.is_empty() && report.right.is_empty() && report.center.is_empty());
    }

    #[test]
    fn scan_memory_is_threaded_between_cycles() {
        let config = PlannerConfig {
            strategy: StrategyKind::AngularScan,
            ..PlannerConfig::default()
        };
        let mut driver = CycleDriver::from_config(&config);
        driver.on_obstacles(cones(&[(3.0, 0.0)]));
        driver.tick().unwrap();
        let memory = driver.context().previous_angle();
        // Rays within 30 degrees of the axis are blocked; memory holds steering degrees
        assert!(memory.abs() >= 30.0 * 3.5 / 8.0 && memory.abs() <= 31.0 * 3.5 / 8.0);

        // Open road: every ray ties, so the scan degree nearest the memory wins
        driver.on_obstacles(ObstacleSet::new());
        let report = driver.tick().unwrap();
        let expected = memory.round() * 3.5 / 8.0;
        assert_relative_eq!(report.steering().unwrap(), expected.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(driver.context().previous_angle(), expected, epsilon = 1e-12);
    }

    #[test]
    fn hold_publishes_no_command() {
        let config = PlannerConfig {
            strategy: StrategyKind::Clustering,
            ..PlannerConfig::default()
        };
        let mut driver = CycleDriver::from_config(&config);
        let mut recorder = Recorder::default();
        let mut debug_out = Recorder::default();

        driver.on_obstacles(cones(&[(0.5, 1.5), (1.0, 1.6), (2.0, 2.5), (2.5, 2.6)]));
        assert!(driver.tick_and_publish(&mut recorder, &mut debug_out).is_none());
        assert!(recorder.commands.is_empty());
    }

    #[test]
    fn debug_failures_do_not_block_command() {
        let mut driver = CycleDriver::from_config(&PlannerConfig::default());
        let mut recorder = Recorder::default();
        driver.on_obstacles(cones(&[(1.0, 1.0), (2.0, 1.2), (1.0, -1.0), (2.0, -1.1)]));
        let command = driver.tick_and_publish(&mut recorder, &mut FailingDebug);
        assert!(command.is_some());
        assert_eq!(recorder.commands.len(), 1);
    }

    #[test]
    fn debug_paths_are_published_per_cycle() {
        let mut driver = CycleDriver::from_config(&PlannerConfig::default());
        let mut commands = Recorder::default();
        let mut debug_out = Recorder::default();
        driver.on_obstacles(cones(&[(1.0, 1.0), (2.0, 1.2), (1.0, -1.0), (2.0, -1.1)]));
        driver.tick_and_publish(&mut commands, &mut debug_out);
        assert_eq!(
            debug_out.paths,
            vec![(PathKind::Left, 2), (PathKind::Right, 2), (PathKind::Center, 2)]
        );
    }

    #[tokio::test]
    async fn loop_processes_stream_and_stops_when_closed() {
        let driver = CycleDriver::from_config(&PlannerConfig::default());
        let (obstacle_tx, obstacle_rx) = mpsc::channel(4);
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        obstacle_tx
            .send(cones(&[(1.0, 1.0), (2.0, 1.2), (1.0, -1.0), (2.0, -1.1)]))
            .await
            .unwrap();
        drop(obstacle_tx);

        run(
            driver,
            obstacle_rx,
            command_tx,
            crate::control::publishers::NullDebugPublisher,
            shutdown_rx,
            Duration::from_millis(10),
        )
        .await
        .unwrap();

        let command = command_rx.recv().await.unwrap();
        assert!(command.steering > 0.0);
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let driver = CycleDriver::from_config(&PlannerConfig::default());
        let (_obstacle_tx, obstacle_rx) = mpsc::channel::<ObstacleSet>(4);
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(run(
            driver,
            obstacle_rx,
            command_tx,
            crate::control::publishers::NullDebugPublisher,
            shutdown_rx,
            Duration::from_millis(10),
        ));
        shutdown_tx.send(true).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }
}
