//! Common utilities and types for the corridor planner
pub mod geometry;

/// Common types used across the codebase
pub mod types {
    use nalgebra::Point2;

    /// A 2D point in the vehicle frame (forward = +x, left = +y)
    pub type Point2D = Point2<f64>;

    /// One detected obstacle as delivered by the detector
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ObstaclePoint {
        pub x: f64,
        pub y: f64,
        /// Radius reported by the detector, if any. The planner uses its own
        /// configured radius for clearance checks.
        pub radius: Option<f64>,
    }

    impl ObstaclePoint {
        pub fn new(x: f64, y: f64) -> Self {
            ObstaclePoint { x, y, radius: None }
        }

        pub fn with_radius(x: f64, y: f64, radius: f64) -> Self {
            ObstaclePoint {
                x,
                y,
                radius: Some(radius),
            }
        }

        pub fn position(&self) -> Point2D {
            Point2D::new(self.x, self.y)
        }
    }

    /// All obstacles from a single detection message
    pub type ObstacleSet = Vec<ObstaclePoint>;

    /// Largest radius the detector reported in `obstacles`
    pub fn largest_detector_radius(obstacles: &[ObstaclePoint]) -> Option<f64> {
        obstacles
            .iter()
            .filter_map(|o| o.radius)
            .max_by(f64::total_cmp)
    }

    /// Ordered points along one side of the corridor, ascending in x
    pub type BoundaryChain = Vec<Point2D>;

    /// Drivable line for the current cycle, sorted by ascending x. Empty means no path.
    pub type CenterPath = Vec<Point2D>;

}
