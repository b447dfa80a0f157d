use anyhow::{bail, Context, Result};
use corridor_core::{
    config::{unknown_override_keys, PlannerConfig},
    control::publishers::LogPublisher,
    perception::sensors::{ObstacleSource, SyntheticCorridor},
    planner::{self, CycleDriver},
};
use log::{info, warn};
use std::collections::HashMap;
use tokio::sync::{mpsc, watch};
use tokio::time;

const DEFAULT_FRAMES: usize = 50;

/// Command line: `corridor_node [config.yaml] [key=value ...]`
///
/// `key=value` pairs override strategy and follower parameters. The special
/// keys `frames` and `seed_source` control the synthetic obstacle source.
struct Args {
    config_path: Option<String>,
    params: HashMap<String, f64>,
}

fn parse_args() -> Result<Args> {
    let mut config_path = None;
    let mut params = HashMap::new();

    for arg in std::env::args().skip(1) {
        match arg.split_once('=') {
            Some((key, value)) => {
                let value: f64 = value
                    .parse()
                    .with_context(|| format!("parameter `{}` is not a number", key))?;
                params.insert(key.to_string(), value);
            }
            None if config_path.is_none() => config_path = Some(arg),
            None => bail!("unexpected argument `{}`", arg),
        }
    }

    Ok(Args {
        config_path,
        params,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = parse_args()?;
    let config = match &args.config_path {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => {
            info!("No config file given, using defaults");
            PlannerConfig::default()
        }
    };

    let frames = args
        .params
        .remove("frames")
        .map_or(DEFAULT_FRAMES, |frames| frames as usize);
    let source_seed = args.params.remove("seed_source").map_or(0, |seed| seed as u64);

    for key in unknown_override_keys(&args.params) {
        warn!("Ignoring unknown parameter `{}`", key);
    }

    let mut driver = CycleDriver::from_config(&config);
    if !args.params.is_empty() {
        driver
            .strategy_mut()
            .configure(&args.params)
            .context("failed to configure boundary strategy")?;
        driver
            .navigation_mut()
            .configure_path_follower(&args.params)
            .context("failed to configure path follower")?;
    }

    info!(
        "Corridor node starting: strategy={:?}, rate={} Hz, frame={}",
        config.strategy, config.tick_rate_hz, config.frame_id
    );

    let (obstacle_tx, obstacle_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Obstacle messages arrive faster than the planner ticks, like a detector would
    let source_period = config.tick_period() / 2;
    let producer = tokio::spawn(async move {
        let mut source = SyntheticCorridor::new(frames, source_seed);
        info!("Feeding {} frames from {}", frames, source.name());
        let mut interval = time::interval(source_period);
        while let Some(set) = source.next_set() {
            interval.tick().await;
            if obstacle_tx.send(set).await.is_err() {
                warn!("Planner stopped before the source was exhausted");
                break;
            }
        }
    });

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown_tx.send(true);
        }
    });

    planner::run(
        driver,
        obstacle_rx,
        LogPublisher,
        LogPublisher,
        shutdown_rx,
        config.tick_period(),
    )
    .await?;

    producer.abort();
    ctrl_c.abort();
    info!("Corridor node stopped");
    Ok(())
}
