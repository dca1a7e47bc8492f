//! Smoothed vertex normals for the terrain grid.

use crate::types::{ColorNormalVertex, UP};
use glam::Vec3;
use tracing::debug;

/// Assign every vertex a normal.
///
/// Interior vertices average six fan faces built from the neighbours right,
/// upper right, up, left, lower left and down (the six that share a triangle
/// with the vertex under the grid's diagonal split). Vertices on the outer
/// ring get [`UP`].
pub fn smooth_normals(vertices: &mut [ColorNormalVertex], width: usize, depth: usize) {
    let mut interior = 0usize;
    for z in 0..depth {
        for x in 0..width {
            let normal = if x == 0 || z == 0 || x + 1 == width || z + 1 == depth {
                UP
            } else {
                interior += 1;
                fan_normal(vertices, x, z, width)
            };
            vertices[x + width * z].normal = normal;
        }
    }
    debug!("Smoothed {} interior normals", interior);
}

fn fan_normal(vertices: &[ColorNormalVertex], x: usize, z: usize, width: usize) -> Vec3 {
    let at = |x: usize, z: usize| vertices[x + width * z].position;

    let a = at(x, z);
    let b = at(x + 1, z);
    let c = at(x + 1, z + 1);
    let d = at(x, z + 1);
    let e = at(x - 1, z);
    let f = at(x - 1, z - 1);
    let g = at(x, z - 1);

    let sum = (c - a).cross(b - a)
        + (d - a).cross(c - a)
        + (e - a).cross(d - a)
        + (f - a).cross(e - a)
        + (g - a).cross(f - a)
        + (b - a).cross(g - a);
    sum.normalize_or_zero()
}
