//! Planner configuration
//!
//! All parameters can be loaded from a YAML file (see `config/corridor_params.yaml`).
//! Missing keys fall back to the defaults below. Strategies additionally accept
//! runtime overrides through their `configure` method.

use crate::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Which boundary strategy drives the cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    AngularScan,
    #[default]
    Chaining,
    Clustering,
    CentroidHeading,
}

/// Clearance-maximizing angular scan
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Radius of the disk each obstacle is inflated to (meters)
    pub obstacle_radius: f64,
    pub min_degree: i32,
    pub max_degree: i32,
    pub step_degree: i32,
    /// Clearance reported for a ray no obstacle blocks (meters)
    pub default_clearance: f64,
    /// Maps scan degrees onto steering degrees (±80° -> ±35°)
    pub steering_scale: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            obstacle_radius: 1.5,
            min_degree: -80,
            max_degree: 80,
            step_degree: 1,
            default_clearance: 10.0,
            steering_scale: 3.5 / 8.0,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("obstacle_radius", self.obstacle_radius)?;
        require_positive("default_clearance", self.default_clearance)?;
        if self.step_degree <= 0 {
            return Err(PlannerError::invalid("step_degree", "must be positive"));
        }
        if self.min_degree > self.max_degree {
            return Err(PlannerError::invalid(
                "min_degree",
                "must not exceed max_degree",
            ));
        }
        if self.min_degree <= -90 || self.max_degree >= 90 {
            return Err(PlannerError::invalid(
                "max_degree",
                "scan bounds must lie strictly inside (-90, 90)",
            ));
        }
        Ok(())
    }
}

/// Nearest-neighbor chaining
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainingConfig {
    /// Maximum gap between consecutive cones in a chain (meters)
    pub link_distance: f64,
    /// A side is only seeded if its nearest cone is closer than this (meters)
    pub seed_distance: f64,
}

impl Default for ChainingConfig {
    fn default() -> Self {
        Self {
            link_distance: 2.5,
            seed_distance: 3.0,
        }
    }
}

impl ChainingConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("link_distance", self.link_distance)?;
        require_positive("seed_distance", self.seed_distance)
    }
}

/// Robust line fit applied to each clustered side
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Minimum sample is `max(2, ratio * side_len)`
    pub min_sample_ratio: f64,
    pub residual_threshold: f64,
    pub max_trials: usize,
    /// Fitted slopes are clamped to `[-slope_limit, slope_limit]`
    pub slope_limit: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_sample_ratio: 0.2,
            residual_threshold: 0.05,
            max_trials: 300,
            slope_limit: 30.0,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_sample_ratio) {
            return Err(PlannerError::invalid(
                "min_sample_ratio",
                "must lie in [0, 1]",
            ));
        }
        require_positive("residual_threshold", self.residual_threshold)?;
        require_positive("slope_limit", self.slope_limit)?;
        if self.max_trials == 0 {
            return Err(PlannerError::invalid("max_trials", "must be positive"));
        }
        Ok(())
    }
}

/// Two-means clustering and cluster center validation
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub max_attempts: usize,
    /// Independent k-means initialisations per attempt; the lowest inertia wins
    pub kmeans_restarts: usize,
    pub kmeans_max_iterations: usize,
    /// Valid centers satisfy `min_center_x < x < max_center_x`
    pub min_center_x: f64,
    pub max_center_x: f64,
    /// Valid centers satisfy `band_inner < |y| < band_outer`
    pub band_inner: f64,
    pub band_outer: f64,
    /// Number of evenly spaced x samples the fitted lines are evaluated at
    pub path_samples: usize,
    /// Fixed RNG seed; entropy seeded when absent
    pub seed: Option<u64>,
    pub fit: FitConfig,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            kmeans_restarts: 10,
            kmeans_max_iterations: 300,
            min_center_x: 0.0,
            max_center_x: 3.0,
            band_inner: 1.0,
            band_outer: 3.0,
            path_samples: 30,
            seed: None,
            fit: FitConfig::default(),
        }
    }
}

impl ClusteringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(PlannerError::invalid("max_attempts", "must be positive"));
        }
        if self.kmeans_restarts == 0 {
            return Err(PlannerError::invalid("kmeans_restarts", "must be positive"));
        }
        if self.path_samples < 2 {
            return Err(PlannerError::invalid("path_samples", "must be at least 2"));
        }
        if self.min_center_x >= self.max_center_x {
            return Err(PlannerError::invalid(
                "min_center_x",
                "must be below max_center_x",
            ));
        }
        if self.band_inner < 0.0 || self.band_inner >= self.band_outer {
            return Err(PlannerError::invalid(
                "band_inner",
                "must be non-negative and below band_outer",
            ));
        }
        self.fit.validate()
    }
}

/// Lookahead pursuit
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    pub lookahead_distance: f64,
    pub wheel_base: f64,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            lookahead_distance: 2.0,
            wheel_base: 1.63,
        }
    }
}

impl PursuitConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("lookahead_distance", self.lookahead_distance)?;
        require_positive("wheel_base", self.wheel_base)
    }
}

/// Longitudinal part of the outgoing command; never computed by the planner
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub mode: u8,
    pub velocity: f64,
    pub accel: f64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            mode: 2,
            velocity: 7.0,
            accel: 0.1,
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub strategy: StrategyKind,
    pub tick_rate_hz: f64,
    pub frame_id: String,
    pub scan: ScanConfig,
    pub chaining: ChainingConfig,
    pub clustering: ClusteringConfig,
    pub pursuit: PursuitConfig,
    pub command: CommandConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            tick_rate_hz: 10.0,
            frame_id: "velodyne".to_string(),
            scan: ScanConfig::default(),
            chaining: ChainingConfig::default(),
            clustering: ClusteringConfig::default(),
            pursuit: PursuitConfig::default(),
            command: CommandConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Load and validate a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: PlannerConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("tick_rate_hz", self.tick_rate_hz)?;
        self.scan.validate()?;
        self.chaining.validate()?;
        self.clustering.validate()?;
        self.pursuit.validate()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(PlannerError::invalid(name, "must be positive"))
    }
}

/// Keys understood by some strategy's or the path follower's `configure`
pub const OVERRIDE_KEYS: &[&str] = &[
    "obstacle_radius",
    "default_clearance",
    "steering_scale",
    "min_degree",
    "max_degree",
    "step_degree",
    "link_distance",
    "seed_distance",
    "max_attempts",
    "max_center_x",
    "band_inner",
    "band_outer",
    "residual_threshold",
    "max_trials",
    "slope_limit",
    "seed",
    "lookahead_distance",
    "wheel_base",
];

/// Override keys no component recognises, sorted
pub fn unknown_override_keys(params: &HashMap<String, f64>) -> Vec<&str> {
    let mut unknown: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|key| !OVERRIDE_KEYS.contains(key))
        .collect();
    unknown.sort_unstable();
    unknown
}

/// Read an optional strictly positive override from a parameter map
pub(crate) fn positive_param(params: &HashMap<String, f64>, name: &str) -> Result<Option<f64>> {
    match params.get(name) {
        Some(&value) if value <= 0.0 => Err(PlannerError::invalid(name, "must be positive")),
        Some(&value) => Ok(Some(value)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "strategy: clustering\npursuit:\n  lookahead_distance: 3.0\n";
        let config = PlannerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.strategy, StrategyKind::Clustering);
        assert_eq!(config.pursuit.lookahead_distance, 3.0);
        assert_eq!(config.pursuit.wheel_base, 1.63);
        assert_eq!(config.clustering.fit.max_trials, 300);
        assert_eq!(config.frame_id, "velodyne");
    }

    #[test]
    fn rejects_non_positive_lookahead() {
        let yaml = "pursuit:\n  lookahead_distance: 0.0\n";
        let err = PlannerConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidParameter { ref name, .. } if name == "lookahead_distance"));
    }

    #[test]
    fn rejects_inverted_scan_bounds() {
        let mut config = PlannerConfig::default();
        config.scan.min_degree = 10;
        config.scan.max_degree = -10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tick_period_follows_rate() {
        assert_eq!(PlannerConfig::default().tick_period(), Duration::from_millis(100));
    }

    #[test]
    fn positive_param_rejects_zero() {
        let mut params = HashMap::new();
        params.insert("wheel_base".to_string(), 0.0);
        assert!(positive_param(&params, "wheel_base").is_err());
        assert_eq!(positive_param(&params, "missing").unwrap(), None);
    }

    #[test]
    fn flags_mistyped_override_keys() {
        let mut params = HashMap::new();
        params.insert("lookahead_distance".to_string(), 2.5);
        params.insert("lookahed_distance".to_string(), 2.5);
        params.insert("link_dist".to_string(), 1.0);
        assert_eq!(unknown_override_keys(&params), vec!["link_dist", "lookahed_distance"]);

        params.retain(|key, _| key == "lookahead_distance");
        assert!(unknown_override_keys(&params).is_empty());
    }
}
