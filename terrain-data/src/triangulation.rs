//! Regular grid triangulation.
//!
//! Every quad `A=(x,z) B=(x+1,z) C=(x+1,z+1) D=(x,z+1)` is split along its
//! `A-C` diagonal into `(A, C, B)` and `(A, D, C)`. Both wind counter-clockwise
//! seen from above, so their face normals point up on flat ground.

use crate::types::{ColorNormalVertex, MeshVertex, Triangle, face_normal};
use glam::Vec2;
use tracing::debug;

/// Number of quads along each axis of a `width x depth` vertex grid.
pub fn quad_counts(width: usize, depth: usize) -> (usize, usize) {
    (width.saturating_sub(1), depth.saturating_sub(1))
}

/// Corner indices `[A, B, C, D]` of the quad at `(x, z)`.
fn quad_corners(x: usize, z: usize, width: usize) -> [usize; 4] {
    [
        x + width * z,
        x + 1 + width * z,
        x + 1 + width * (z + 1),
        x + width * (z + 1),
    ]
}

/// Index buffer for a vertex grid, six indices per quad.
pub fn grid_indices(width: usize, depth: usize) -> Vec<u32> {
    let (quads_x, quads_z) = quad_counts(width, depth);
    let mut indices = Vec::with_capacity(6 * quads_x * quads_z);

    for z in 0..quads_z {
        for x in 0..quads_x {
            let [a, b, c, d] = quad_corners(x, z, width).map(|i| i as u32);
            indices.extend_from_slice(&[a, c, b, a, d, c]);
        }
    }

    debug!(
        "Triangulated {}x{} grid into {} triangles",
        width,
        depth,
        indices.len() / 3
    );
    indices
}

/// Triangle pairs `(bottom, top)` per quad, indexed `[z][x]`.
pub fn terrain_triangles(
    vertices: &[ColorNormalVertex],
    width: usize,
    depth: usize,
) -> Vec<Vec<(Triangle, Triangle)>> {
    let (quads_x, quads_z) = quad_counts(width, depth);
    (0..quads_z)
        .map(|z| {
            (0..quads_x)
                .map(|x| quad_triangles(vertices, x, z, width))
                .collect()
        })
        .collect()
}

/// The `(bottom, top)` triangles of the quad at `(x, z)`.
///
/// `bottom` covers the half of the quad where the local x offset is at least
/// the local z offset.
pub fn quad_triangles(
    vertices: &[ColorNormalVertex],
    x: usize,
    z: usize,
    width: usize,
) -> (Triangle, Triangle) {
    let [a, b, c, d] = quad_corners(x, z, width).map(|i| vertices[i].position);
    (Triangle::new(a, c, b), Triangle::new(a, d, c))
}

/// Expand an indexed mesh into a triangle list with per-face normals.
///
/// Each vertex's uv is re-derived from its position as `(x, y)`, unlike the
/// indexed views which map the ground plane.
pub fn flatten(vertices: &[ColorNormalVertex], indices: &[u32]) -> Vec<MeshVertex> {
    let mut out = Vec::with_capacity(indices.len());
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] =
            [triangle[0], triangle[1], triangle[2]].map(|i| vertices[i as usize].position);
        let normal = face_normal(a, b, c);
        out.extend([a, b, c].map(|position| MeshVertex {
            position,
            normal,
            uv: Vec2::new(position.x, position.y),
        }));
    }
    out
}
