//! Loader configuration.

use crate::types::{GREEN, WHITE};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which neighbour values an interior hole reads while being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleFillMode {
    /// Holes are filled in place in row-major order, so a hole sees the
    /// already-filled value of any neighbour processed before it.
    #[default]
    Sequential,
    /// Every hole reads the grid as it was before any hole was filled.
    Snapshot,
}

impl std::str::FromStr for HoleFillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(format!(
                "unknown hole fill mode '{other}' (expected sequential or snapshot)"
            )),
        }
    }
}

/// Configuration for [`crate::TerrainLoader`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoaderConfig {
    /// Color given to points read from text files.
    pub text_color: Vec3,
    /// Color given to points read from raw `.lasbin` files.
    pub raw_color: Vec3,
    /// Color given to LAS format 1 records, which store no RGB.
    pub las_color: Vec3,
    /// Multiplier applied to stored 16-bit RGB of LAS format 2 records.
    ///
    /// The default of `0.00001` maps 65535 to ~0.655 rather than 1.0.
    /// Files written with 8-bit color scaled into 16 bits look dark under
    /// it; `1.0 / 65535.0` gives a full-range mapping.
    pub las_rgb_scale: f32,
    pub hole_fill: HoleFillMode,
    /// Largest height grid, in cells, the loader will allocate.
    pub max_grid_cells: usize,
}

/// Default cell limit: an 8192 x 8192 grid.
pub const DEFAULT_MAX_GRID_CELLS: usize = 1 << 26;

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            text_color: GREEN,
            raw_color: WHITE,
            las_color: GREEN,
            las_rgb_scale: 0.00001,
            hole_fill: HoleFillMode::Sequential,
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
        }
    }
}

impl LoaderConfig {
    pub fn with_text_color(mut self, color: Vec3) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_raw_color(mut self, color: Vec3) -> Self {
        self.raw_color = color;
        self
    }

    pub fn with_las_color(mut self, color: Vec3) -> Self {
        self.las_color = color;
        self
    }

    pub fn with_las_rgb_scale(mut self, scale: f32) -> Self {
        self.las_rgb_scale = scale;
        self
    }

    pub fn with_hole_fill(mut self, mode: HoleFillMode) -> Self {
        self.hole_fill = mode;
        self
    }

    pub fn with_max_grid_cells(mut self, cells: usize) -> Self {
        self.max_grid_cells = cells;
        self
    }
}
