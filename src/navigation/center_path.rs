//! Center path synthesis from left/right boundaries

use crate::common::types::{CenterPath, Point2D};
use crate::perception::{BoundaryEstimate, FittedBoundaries};

/// Center path for a boundary estimate.
///
/// Returns `None` for estimates that carry no path (direct steering or a
/// failed fit).
pub fn synthesize(estimate: &BoundaryEstimate) -> Option<CenterPath> {
    match estimate {
        BoundaryEstimate::Chains { left, right } => Some(from_chains(left, right)),
        BoundaryEstimate::Fitted(fitted) => Some(from_fits(fitted)),
        BoundaryEstimate::Steering(_) | BoundaryEstimate::NoFit => None,
    }
}

/// Mean of the left and right fitted y at every shared x sample
pub fn from_fits(fitted: &FittedBoundaries) -> CenterPath {
    fitted
        .samples_x
        .iter()
        .zip(fitted.left_y.iter().zip(&fitted.right_y))
        .map(|(&x, (&left, &right))| Point2D::new(x, (left + right) / 2.0))
        .collect()
}

/// Merge two independently sized chains into one path.
///
/// Matched indices are averaged. Past the shorter chain, the longer chain's
/// remaining points are shifted by the offset between the last center point
/// and the longer chain's point at that index. A single chain is shifted so
/// it starts at the origin. The result is sorted by ascending x.
pub fn from_chains(left: &[Point2D], right: &[Point2D]) -> CenterPath {
    let mut path = match (left.is_empty(), right.is_empty()) {
        (true, true) => return CenterPath::new(),
        (false, true) => anchor_to_origin(left),
        (true, false) => anchor_to_origin(right),
        (false, false) => {
            let matched = left.len().min(right.len());
            let mut path: CenterPath = left
                .iter()
                .zip(right)
                .map(|(l, r)| Point2D::from((l.coords + r.coords) / 2.0))
                .collect();

            let longer = if left.len() > right.len() { left } else { right };
            if longer.len() > matched {
                let offset = path[matched - 1] - longer[matched - 1];
                path.extend(longer[matched..].iter().map(|p| p + offset));
            }
            path
        }
    };

    path.sort_by(|a, b| a.x.total_cmp(&b.x));
    path
}

fn anchor_to_origin(chain: &[Point2D]) -> CenterPath {
    let shift = -chain[0].coords;
    chain.iter().map(|p| p + shift).collect()
}
