//! Core data types for point clouds, terrain vertices, and triangles.
//!
//! The vertex structs are `#[repr(C)]` and `Pod` so a renderer can upload
//! the buffers returned by [`crate::TerrainLoader`] without repacking.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Flat green used for samples that carry no color of their own.
pub const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Fully lit, uncolored.
pub const WHITE: Vec3 = Vec3::ONE;

/// Normal given to vertices on the outer ring of the grid.
pub const UP: Vec3 = Vec3::Y;

/// A colored point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Position in loader space (Y is height).
    pub position: Vec3,
    /// RGB color (0-1 range).
    pub color: Vec3,
}

impl Point {
    /// Create a new point with position and color.
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

/// Axis-aligned bounds of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Extent on each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Point cloud vertex as handed to a point renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: Vec3,
    pub color: Vec3,
}

impl From<&Point> for ColorVertex {
    fn from(point: &Point) -> Self {
        Self {
            position: point.position,
            color: point.color,
        }
    }
}

/// Textured mesh vertex.
///
/// `uv` is copied from the vertex position, not a normalized texture
/// coordinate: `(x, z)` in the indexed view and `(x, y)` in the flattened
/// view. Samplers are expected to use a repeating address mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// Vertex colored from the averaged point colors of its grid cell.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColorNormalVertex {
    pub position: Vec3,
    pub color: Vec3,
    pub normal: Vec3,
}

/// A triangle with its face normal, used for height and collision queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
    /// Unit face normal of `a, b, c`.
    pub normal: Vec3,
}

impl Triangle {
    /// Build a triangle and compute its face normal.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            a,
            b,
            c,
            normal: face_normal(a, b, c),
        }
    }

    /// Height of the triangle's plane above the ground position `(x, z)`.
    ///
    /// Returns `None` for triangles standing vertically.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        if self.normal.y.abs() <= f32::EPSILON {
            return None;
        }
        let n = self.normal;
        Some(self.a.y - (n.x * (x - self.a.x) + n.z * (z - self.a.z)) / n.y)
    }
}

/// Unit normal of the triangle `a, b, c` (counter-clockwise front face).
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}
