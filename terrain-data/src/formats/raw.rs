//! Headerless binary point clouds (`.lasbin`).

use super::AxisRemap;
use crate::error::{LoadError, Result};
use crate::types::Point;
use glam::Vec3;

const TRIPLET_SIZE: usize = std::mem::size_of::<[f32; 3]>();

/// Read tightly packed native-endian `f32` triplets.
pub fn read_raw(bytes: &[u8], color: Vec3) -> Result<Vec<Point>> {
    if bytes.len() % TRIPLET_SIZE != 0 {
        return Err(LoadError::TruncatedData {
            what: "raw point data",
            expected: bytes.len().next_multiple_of(TRIPLET_SIZE) as u64,
            actual: bytes.len() as u64,
        });
    }

    Ok(bytes
        .chunks_exact(TRIPLET_SIZE)
        .map(|chunk| {
            let stored: [f32; 3] = bytemuck::pod_read_unaligned(chunk);
            Point::new(AxisRemap::RAW.apply(stored), color)
        })
        .collect())
}
