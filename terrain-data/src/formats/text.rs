//! Whitespace separated text point clouds.

use super::AxisRemap;
use crate::error::Result;
use crate::types::Point;
use glam::Vec3;
use std::io::BufRead;
use tracing::{debug, warn};

/// Read one point per line from `X Z Y` columns.
///
/// Columns after the third are ignored. Blank lines are skipped, and so are
/// lines that are not UTF-8 or lack three numeric columns.
pub fn read_text<R: BufRead>(reader: R, color: Vec3) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    let mut skipped = 0usize;

    for (line_number, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes?;
        let Ok(line) = std::str::from_utf8(&bytes) else {
            debug!("Skipping line {}: not UTF-8", line_number + 1);
            skipped += 1;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut columns = line.split_whitespace().map(str::parse::<f32>);
        match (columns.next(), columns.next(), columns.next()) {
            (Some(Ok(a)), Some(Ok(b)), Some(Ok(c))) => {
                points.push(Point::new(AxisRemap::TEXT.apply([a, b, c]), color));
            }
            _ => {
                debug!("Skipping line {}: {:?}", line_number + 1, line);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed lines", skipped);
    }
    Ok(points)
}
