//! Point cloud to terrain mesh pipeline.

use crate::bounds::{self, Normalization};
use crate::config::LoaderConfig;
use crate::error::Result;
use crate::formats::{self, LasHeader, PointCloudData};
use crate::heightmap::{self, HeightGrid};
use crate::normals;
use crate::triangulation;
use crate::types::{Bounds, ColorNormalVertex, ColorVertex, MeshVertex, Point, Triangle};
use glam::{Vec2, Vec3};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// A terrain mesh built from one point cloud file.
///
/// The whole pipeline runs in the constructor; afterwards the loader only
/// hands out views of the finished buffers.
#[derive(Debug, Clone)]
pub struct TerrainLoader {
    points: Vec<Point>,
    normalization: Normalization,
    width: usize,
    depth: usize,
    vertices: Vec<ColorNormalVertex>,
    indices: Vec<u32>,
    holes: usize,
    filled_holes: usize,
    las_header: Option<LasHeader>,
}

/// Serializable overview of a built terrain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainSummary {
    pub points: usize,
    pub width: usize,
    pub depth: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub holes: usize,
    pub filled_holes: usize,
    pub bounds: Bounds,
    pub offset: [f32; 3],
    pub min_y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub las_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub las_point_format: Option<u8>,
}

impl TerrainLoader {
    /// Load `path` with the default configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_config(path, &LoaderConfig::default())
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path_with_config(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<Self> {
        let data = formats::read_points(path.as_ref(), config)?;
        Self::from_point_cloud(data, config)
    }

    /// Build a terrain from points already in loader axes.
    pub fn from_points(points: Vec<Point>, config: &LoaderConfig) -> Result<Self> {
        Self::from_point_cloud(PointCloudData::from_points(points), config)
    }

    pub fn from_point_cloud(data: PointCloudData, config: &LoaderConfig) -> Result<Self> {
        let PointCloudData {
            mut points,
            header_bounds,
            las_header,
        } = data;

        let normalization = bounds::normalize(&mut points, header_bounds);
        let grid = HeightGrid::build(&points, &normalization.bounds, config.max_grid_cells)?;
        let (width, depth) = (grid.width(), grid.depth());

        let max_y = normalization.bounds.max.y;
        let (mut vertices, holes) = grid.assemble(max_y);
        let filled_holes =
            heightmap::fill_holes(&mut vertices, width, depth, &holes, config.hole_fill);
        let indices = triangulation::grid_indices(width, depth);
        normals::smooth_normals(&mut vertices, width, depth);

        info!(
            "Built {}x{} terrain from {} points: {} triangles, {} holes ({} filled)",
            width,
            depth,
            points.len(),
            indices.len() / 3,
            holes.len(),
            filled_holes
        );

        Ok(Self {
            points,
            normalization,
            width,
            depth,
            vertices,
            indices,
            holes: holes.len(),
            filled_holes,
            las_header,
        })
    }

    /// The normalized point cloud.
    pub fn point_data(&self) -> Vec<ColorVertex> {
        self.points.iter().map(ColorVertex::from).collect()
    }

    /// Grid vertices with smoothed normals and ground-plane uv.
    pub fn indexed_data(&self) -> (Vec<MeshVertex>, &[u32]) {
        let vertices = self
            .vertices
            .iter()
            .map(|v| MeshVertex {
                position: v.position,
                normal: v.normal,
                uv: Vec2::new(v.position.x, v.position.z),
            })
            .collect();
        (vertices, &self.indices)
    }

    /// Non-indexed triangle list with face normals.
    pub fn vertex_data(&self) -> Vec<MeshVertex> {
        triangulation::flatten(&self.vertices, &self.indices)
    }

    /// Grid vertices with averaged point color and smoothed normals.
    pub fn indexed_color_normal_data(&self) -> (&[ColorNormalVertex], &[u32]) {
        (&self.vertices, &self.indices)
    }

    /// Triangle pairs per quad, indexed `[z][x]`.
    pub fn terrain_data(&self) -> Vec<Vec<(Triangle, Triangle)>> {
        triangulation::terrain_triangles(&self.vertices, self.width, self.depth)
    }

    /// Height of the mesh surface above the ground position `(x, z)`.
    ///
    /// Returns `None` outside the triangulated area.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let (quads_x, quads_z) = triangulation::quad_counts(self.width, self.depth);
        if quads_x == 0
            || quads_z == 0
            || !(0.0..=quads_x as f32).contains(&x)
            || !(0.0..=quads_z as f32).contains(&z)
        {
            return None;
        }
        let qx = (x.floor() as usize).min(quads_x - 1);
        let qz = (z.floor() as usize).min(quads_z - 1);
        let (bottom, top) = triangulation::quad_triangles(&self.vertices, qx, qz, self.width);
        let triangle = if x - qx as f32 >= z - qz as f32 {
            bottom
        } else {
            top
        };
        triangle.height_at(x, z)
    }

    /// Lowest height in the mesh; empty border cells sit here.
    pub fn min_y(&self) -> f32 {
        -self.normalization.bounds.max.y
    }

    /// Bounds after normalization.
    pub fn bounds(&self) -> Bounds {
        self.normalization.bounds
    }

    /// Translation that was subtracted from the input points.
    pub fn offset(&self) -> Vec3 {
        self.normalization.offset
    }

    /// Vertex grid `(width, depth)`.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.width, self.depth)
    }

    pub fn hole_count(&self) -> usize {
        self.holes
    }

    pub fn filled_hole_count(&self) -> usize {
        self.filled_holes
    }

    pub fn las_header(&self) -> Option<&LasHeader> {
        self.las_header.as_ref()
    }

    pub fn summary(&self) -> TerrainSummary {
        TerrainSummary {
            points: self.points.len(),
            width: self.width,
            depth: self.depth,
            vertices: self.vertices.len(),
            triangles: self.indices.len() / 3,
            holes: self.holes,
            filled_holes: self.filled_holes,
            bounds: self.bounds(),
            offset: self.normalization.offset.to_array(),
            min_y: self.min_y(),
            las_version: self
                .las_header
                .as_ref()
                .map(|h| format!("{}.{}", h.version_major, h.version_minor)),
            las_point_format: self.las_header.as_ref().map(|h| h.point_data_record_format),
        }
    }
}
