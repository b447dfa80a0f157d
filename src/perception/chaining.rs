//! Nearest-neighbor chaining of cones into left and right boundaries

use super::{BoundaryEstimate, BoundaryStrategy};
use crate::common::geometry::{distance, norm};
use crate::common::types::{BoundaryChain, ObstaclePoint, Point2D};
use crate::config::{positive_param, ChainingConfig};
use crate::error::Result;
use log::debug;
use std::collections::HashMap;

/// Which side of the vehicle a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn contains(self, point: &Point2D) -> bool {
        match self {
            Side::Left => point.y > 0.0,
            Side::Right => point.y < 0.0,
        }
    }
}

#[derive(Debug)]
pub struct ChainingStrategy {
    config: ChainingConfig,
}

impl ChainingStrategy {
    pub fn with_config(config: ChainingConfig) -> Self {
        ChainingStrategy { config }
    }

    /// Build the chain for one side.
    ///
    /// Seeds with the side's cone nearest the origin (if within the seed
    /// distance), then keeps appending the cone nearest the origin among those
    /// ahead of the tail and within the link distance of it.
    pub fn build_chain(&self, obstacles: &[ObstaclePoint], side: Side) -> BoundaryChain {
        let points: Vec<Point2D> = obstacles
            .iter()
            .map(ObstaclePoint::position)
            .filter(|p| side.contains(p))
            .collect();

        let mut chain = BoundaryChain::new();
        let Some(seed) = nearest_to_origin(points.iter()) else {
            return chain;
        };
        if norm(&seed) >= self.config.seed_distance {
            return chain;
        }
        chain.push(seed);

        let mut tail = seed;
        while let Some(next) = nearest_to_origin(points.iter().filter(|p| {
            p.x > tail.x && distance(p, &tail) <= self.config.link_distance
        })) {
            chain.push(next);
            tail = next;
        }

        chain
    }
}

fn nearest_to_origin<'a>(points: impl Iterator<Item = &'a Point2D>) -> Option<Point2D> {
    points
        .min_by(|a, b| norm(a).total_cmp(&norm(b)))
        .copied()
}

impl BoundaryStrategy for ChainingStrategy {
    fn new() -> Self {
        Self::with_config(ChainingConfig::default())
    }

    fn extract(&mut self, obstacles: &[ObstaclePoint], _previous_angle: f64) -> BoundaryEstimate {
        if obstacles.len() < 2 {
            return BoundaryEstimate::Chains {
                left: BoundaryChain::new(),
                right: BoundaryChain::new(),
            };
        }

        let left = self.build_chain(obstacles, Side::Left);
        let right = self.build_chain(obstacles, Side::Right);
        debug!(
            "Chaining: {} obstacles -> left {} / right {}",
            obstacles.len(),
            left.len(),
            right.len()
        );

        BoundaryEstimate::Chains { left, right }
    }

    fn name(&self) -> &str {
        "Chaining"
    }

    fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(link) = positive_param(params, "link_distance")? {
            self.config.link_distance = link;
        }
        if let Some(seed) = positive_param(params, "seed_distance")? {
            self.config.seed_distance = seed;
        }
        Ok(())
    }
}
