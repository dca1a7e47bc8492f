//! Point cloud bounds and translation to a zero origin.

use crate::types::{Bounds, Point};
use glam::Vec3;
use tracing::debug;

/// Result of moving a point cloud's minimum corner to the origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Normalization {
    /// Bounds relative to the new origin.
    pub bounds: Bounds,
    /// Half of the original maximum corner.
    pub middle: Vec3,
    /// Translation subtracted from every point.
    pub offset: Vec3,
}

/// Per-axis min and max over all points.
///
/// `seeded` bounds (from a file header) are trusted and returned as-is
/// unless their maximum is the all-zero default. An empty cloud has
/// all-zero bounds.
pub fn find_min_max(points: &[Point], seeded: Option<Bounds>) -> Bounds {
    if let Some(bounds) = seeded.filter(|b| b.max != Vec3::ZERO) {
        debug!("Using header bounds {:?}", bounds);
        return bounds;
    }
    if points.is_empty() {
        return Bounds::default();
    }

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for point in points {
        min = min.min(point.position);
        max = max.max(point.position);
    }
    Bounds::new(min, max)
}

/// Derive the center and offset of `bounds` and rebase them on the offset.
pub fn calc_center(bounds: Bounds) -> Normalization {
    let size = bounds.min + (bounds.max - bounds.min);
    let middle = size / 2.0;
    let offset = bounds.min;

    Normalization {
        bounds: Bounds::new(bounds.min - offset, bounds.max - offset),
        middle,
        offset,
    }
}

/// Translate every point by `-offset`.
///
/// A zero `middle` means the cloud is taken as already placed and the points
/// are left untouched.
pub fn update_points(points: &mut [Point], normalization: &Normalization) {
    if normalization.middle == Vec3::ZERO {
        debug!("Middle is zero, points left in place");
        return;
    }
    for point in points.iter_mut() {
        point.position -= normalization.offset;
    }
}

/// Run bounds, center and translation in order.
pub fn normalize(points: &mut [Point], seeded: Option<Bounds>) -> Normalization {
    let normalization = calc_center(find_min_max(points, seeded));
    update_points(points, &normalization);
    debug!(
        "Normalized {} points: offset {:?}, extent {:?}",
        points.len(),
        normalization.offset,
        normalization.bounds.size()
    );
    normalization
}
