//! Point cloud file readers.
//!
//! The reader is picked from the file name. Every format stores its axes
//! differently, so each one declares an [`AxisRemap`] that turns a stored
//! triple into a loader-space position (Y up, Z depth).

mod las;
mod raw;
mod text;

pub use las::{LasHeader, LasPointFormat, LAS_HEADER_SIZE, read_las};
pub use raw::read_raw;
pub use text::read_text;

#[cfg(test)]
pub(crate) use las::test_support;

use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::types::{Bounds, Point};
use glam::Vec3;
use std::path::Path;
use tracing::{info, warn};

/// Maps the three stored components of a sample onto loader axes.
///
/// Each field holds the index of the stored component that feeds that
/// output axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRemap {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl AxisRemap {
    /// Columns are stored X Z Y.
    pub const TEXT: Self = Self { x: 0, y: 2, z: 1 };
    /// Stored (x, y, z) with y as depth and z as height.
    pub const RAW: Self = Self { x: 0, y: 2, z: 1 };
    /// LAS is Z-up: raw X to X, raw Z to height, raw Y to depth.
    pub const LAS: Self = Self { x: 0, y: 2, z: 1 };

    pub fn apply<T: Copy + Into<f64>>(&self, stored: [T; 3]) -> Vec3 {
        let component = |i: usize| Into::<f64>::into(stored[i]) as f32;
        Vec3::new(component(self.x), component(self.y), component(self.z))
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.txt`: one `X Z Y` sample per line.
    Text,
    /// `.lasbin`: headerless packed `f32` triplets.
    RawBinary,
    /// `.las`: LAS 1.x with point data record format 1 or 2.
    Las,
}

impl SourceFormat {
    /// Recognized file name suffixes.
    ///
    /// Matching is on the end of the name, so at most one entry can match and
    /// the order carries no priority: `.lasbin` never matches `.las`.
    const SUFFIXES: [(&'static str, SourceFormat); 3] = [
        (".txt", SourceFormat::Text),
        (".lasbin", SourceFormat::RawBinary),
        (".las", SourceFormat::Las),
    ];

    /// Pick the format from the suffix of the file name, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|&(_, format)| format)
    }

    pub fn axis_remap(&self) -> AxisRemap {
        match self {
            SourceFormat::Text => AxisRemap::TEXT,
            SourceFormat::RawBinary => AxisRemap::RAW,
            SourceFormat::Las => AxisRemap::LAS,
        }
    }
}

/// Everything a reader produced from one file.
#[derive(Debug, Clone, Default)]
pub struct PointCloudData {
    pub points: Vec<Point>,
    /// Bounds stored in the file header, already remapped to loader axes.
    pub header_bounds: Option<Bounds>,
    pub las_header: Option<LasHeader>,
}

impl PointCloudData {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }
}

/// Read all points from `path`.
///
/// A file that cannot be opened or read yields an empty cloud and a
/// warning. Malformed content is an error.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_points(path: &Path, config: &LoaderConfig) -> Result<PointCloudData> {
    let format = SourceFormat::from_path(path)
        .ok_or_else(|| LoadError::UnrecognizedFormat(path.display().to_string()))?;

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Can't open file {}: {}", path.display(), e);
            return Ok(PointCloudData::default());
        }
    };

    let data = match format {
        SourceFormat::Text => PointCloudData::from_points(read_text(&bytes[..], config.text_color)?),
        SourceFormat::RawBinary => PointCloudData::from_points(read_raw(&bytes, config.raw_color)?),
        SourceFormat::Las => {
            let (header, points) = read_las(&bytes, config)?;
            PointCloudData {
                points,
                header_bounds: Some(header.bounds()),
                las_header: Some(header),
            }
        }
    };

    info!("Read {} points ({:?})", data.points.len(), format);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_suffix() {
        assert_eq!(SourceFormat::from_path(Path::new("scan.txt")), Some(SourceFormat::Text));
        assert_eq!(
            SourceFormat::from_path(Path::new("data/scan.lasbin")),
            Some(SourceFormat::RawBinary)
        );
        assert_eq!(SourceFormat::from_path(Path::new("scan.LAS")), Some(SourceFormat::Las));
        assert_eq!(SourceFormat::from_path(Path::new("scan.laz")), None);
        assert_eq!(SourceFormat::from_path(Path::new("scan.las.txt")), Some(SourceFormat::Text));
    }

    #[test]
    fn test_axis_remap_swaps_height_and_depth() {
        let stored = [1.0f32, 2.0, 3.0];
        for remap in [AxisRemap::TEXT, AxisRemap::RAW, AxisRemap::LAS] {
            assert_eq!(remap.apply(stored), Vec3::new(1.0, 3.0, 2.0));
        }
    }

    #[test]
    fn test_missing_file_yields_empty_cloud() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let data = read_points(&path, &LoaderConfig::default()).unwrap();
        assert!(data.points.is_empty());
        assert!(data.header_bounds.is_none());
    }

    #[test]
    fn test_unknown_suffix_is_an_error() {
        let err = read_points(Path::new("cloud.xyz"), &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnrecognizedFormat(_)));
    }

    #[test]
    fn test_read_text_file_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "1.0 2.0 3.0").unwrap();
        writeln!(file, "4.0 5.0 6.0").unwrap();
        let data = read_points(file.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(data.points.len(), 2);
        assert_eq!(data.points[1].position, Vec3::new(4.0, 6.0, 5.0));
    }
}
