//! Terrain Data Crate
//!
//! Turns LIDAR-style point clouds into a renderable height grid mesh.
//! This crate is GPU-agnostic; its vertex types are `Pod` so a renderer can
//! upload the buffers directly.
//!
//! ## Pipeline
//!
//! 1. [`formats`]: read `.txt`, `.lasbin` or `.las` files into colored points
//! 2. [`bounds`]: find the bounding box and move its minimum corner to the origin
//! 3. [`heightmap`]: bin points into a unit grid and patch empty cells
//! 4. [`triangulation`]: index the grid, two triangles per quad
//! 5. [`normals`]: smoothed per-vertex normals
//!
//! [`TerrainLoader`] runs all of it once and exposes the results.
//!
//! ## Example
//!
//! ```ignore
//! use terrain_data::TerrainLoader;
//!
//! let terrain = TerrainLoader::from_path("survey.las")?;
//! let (vertices, indices) = terrain.indexed_data();
//! ```

pub mod bounds;
pub mod config;
pub mod error;
pub mod formats;
pub mod heightmap;
pub mod loader;
pub mod normals;
pub mod triangulation;
pub mod types;

pub use config::{HoleFillMode, LoaderConfig};
pub use error::LoadError;
pub use formats::{LasHeader, SourceFormat};
pub use loader::{TerrainLoader, TerrainSummary};
pub use types::{Bounds, ColorNormalVertex, ColorVertex, MeshVertex, Point, Triangle};
