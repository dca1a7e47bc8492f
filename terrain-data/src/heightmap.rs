//! Binning normalized points into a unit height grid and patching empty cells.

use crate::config::HoleFillMode;
use crate::error::{LoadError, Result};
use crate::types::{Bounds, ColorNormalVertex, Point, WHITE};
use glam::Vec3;
use tracing::debug;

/// Samples accumulated into one grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridCell {
    pub count: u32,
    pub height_sum: f32,
    pub color_sum: Vec3,
}

/// Row-major grid of accumulated samples, one cell per unit of ground extent.
#[derive(Debug, Clone)]
pub struct HeightGrid {
    width: usize,
    depth: usize,
    cells: Vec<GridCell>,
}

/// Grid dimensions `(width, depth)` for normalized bounds.
pub fn grid_dimensions(bounds: &Bounds) -> (usize, usize) {
    let size = bounds.size();
    // `as` saturates: negative or NaN extents give an empty grid
    (size.x.floor() as usize, size.z.floor() as usize)
}

impl HeightGrid {
    /// Accumulate every point whose truncated ground position lands inside
    /// the grid. Points outside are dropped, not clamped.
    ///
    /// Fails with [`LoadError::GridTooLarge`] when the grid would hold more
    /// than `max_cells` cells.
    pub fn build(points: &[Point], bounds: &Bounds, max_cells: usize) -> Result<Self> {
        let (width, depth) = grid_dimensions(bounds);
        let cell_count = width
            .checked_mul(depth)
            .filter(|&n| n <= max_cells)
            .ok_or(LoadError::GridTooLarge {
                width,
                depth,
                limit: max_cells,
            })?;
        let mut cells = vec![GridCell::default(); cell_count];

        let mut discarded = 0usize;
        for point in points {
            let x = point.position.x.trunc();
            let z = point.position.z.trunc();
            if !(0.0..width as f32).contains(&x) || !(0.0..depth as f32).contains(&z) {
                discarded += 1;
                continue;
            }
            let cell = &mut cells[x as usize + width * z as usize];
            cell.count += 1;
            cell.height_sum += point.position.y;
            cell.color_sum += point.color;
        }

        debug!(
            "Binned {} points into {}x{} grid ({} outside)",
            points.len() - discarded,
            width,
            depth,
            discarded
        );
        Ok(Self { width, depth, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cell(&self, x: usize, z: usize) -> &GridCell {
        &self.cells[x + self.width * z]
    }

    /// Average every cell into a vertex at `(x, mean height - max_y, z)`.
    ///
    /// Empty cells get the sentinel height `-max_y` and white, and are
    /// returned as holes in row-major order.
    pub fn assemble(&self, max_y: f32) -> (Vec<ColorNormalVertex>, Vec<(usize, usize)>) {
        let mut vertices = Vec::with_capacity(self.cells.len());
        let mut holes = Vec::new();

        for z in 0..self.depth {
            for x in 0..self.width {
                let cell = self.cell(x, z);
                let (height, color) = if cell.count == 0 {
                    holes.push((x, z));
                    (-max_y, WHITE)
                } else {
                    let count = cell.count as f32;
                    (cell.height_sum / count - max_y, cell.color_sum / count)
                };
                vertices.push(ColorNormalVertex {
                    position: Vec3::new(x as f32, height, z as f32),
                    color,
                    normal: Vec3::ZERO,
                });
            }
        }
        (vertices, holes)
    }
}

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// Replace the height and color of interior holes with the mean of their
/// eight neighbours. Holes on the grid border keep the sentinel.
///
/// Returns the number of holes filled.
pub fn fill_holes(
    vertices: &mut [ColorNormalVertex],
    width: usize,
    depth: usize,
    holes: &[(usize, usize)],
    mode: HoleFillMode,
) -> usize {
    let snapshot = match mode {
        HoleFillMode::Sequential => None,
        HoleFillMode::Snapshot => Some(vertices.to_vec()),
    };

    let mut filled = 0;
    for &(x, z) in holes {
        if x == 0 || z == 0 || x + 1 >= width || z + 1 >= depth {
            continue;
        }

        let source: &[ColorNormalVertex] = snapshot.as_deref().unwrap_or(&*vertices);
        let mut height = 0.0;
        let mut color = Vec3::ZERO;
        for (dx, dz) in NEIGHBOURS {
            let nx = x.wrapping_add_signed(dx);
            let nz = z.wrapping_add_signed(dz);
            let neighbour = &source[nx + width * nz];
            height += neighbour.position.y;
            color += neighbour.color;
        }

        let vertex = &mut vertices[x + width * z];
        vertex.position.y = height / 8.0;
        vertex.color = color / 8.0;
        filled += 1;
    }

    debug!("Filled {} of {} holes ({:?})", filled, holes.len(), mode);
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GREEN;

    const LIMIT: usize = crate::config::DEFAULT_MAX_GRID_CELLS;

    fn point(x: f32, y: f32, z: f32) -> Point {
        Point::new(Vec3::new(x, y, z), GREEN)
    }

    fn bounds(w: f32, h: f32, d: f32) -> Bounds {
        Bounds::new(Vec3::ZERO, Vec3::new(w, h, d))
    }

    /// One sample per cell of a `w x d` grid, except at `skip`.
    fn grid_points(
        w: usize,
        d: usize,
        skip: &[(usize, usize)],
        height: impl Fn(usize, usize) -> f32,
    ) -> Vec<Point> {
        let mut pts = Vec::new();
        for z in 0..d {
            for x in 0..w {
                if !skip.contains(&(x, z)) {
                    pts.push(point(x as f32 + 0.5, height(x, z), z as f32 + 0.5));
                }
            }
        }
        pts
    }

    #[test]
    fn test_dimensions_truncate_extent() {
        assert_eq!(grid_dimensions(&bounds(3.9, 1.0, 2.1)), (3, 2));
        assert_eq!(grid_dimensions(&Bounds::default()), (0, 0));
    }

    #[test]
    fn test_oversized_grid_is_an_error() {
        let pts = vec![point(0.0, 0.0, 0.0)];
        let err = HeightGrid::build(&pts, &bounds(1e20, 1.0, 1e20), LIMIT).unwrap_err();
        assert!(matches!(err, LoadError::GridTooLarge { .. }));

        let err = HeightGrid::build(&pts, &bounds(5.0, 1.0, 5.0), 24).unwrap_err();
        assert!(matches!(
            err,
            LoadError::GridTooLarge {
                width: 5,
                depth: 5,
                limit: 24
            }
        ));
        assert!(HeightGrid::build(&pts, &bounds(5.0, 1.0, 5.0), 25).is_ok());
    }

    #[test]
    fn test_binning_averages_height_and_color() {
        let pts = vec![
            Point::new(Vec3::new(0.2, 1.0, 0.7), Vec3::new(1.0, 0.0, 0.0)),
            Point::new(Vec3::new(0.9, 3.0, 0.1), Vec3::new(0.0, 0.0, 1.0)),
            point(1.5, 5.0, 0.5),
        ];
        let grid = HeightGrid::build(&pts, &bounds(2.0, 5.0, 1.0), LIMIT).unwrap();
        assert_eq!(grid.cell(0, 0).count, 2);
        assert_eq!(grid.cell(0, 0).height_sum, 4.0);
        assert_eq!(grid.cell(1, 0).count, 1);

        let (vertices, holes) = grid.assemble(5.0);
        assert!(holes.is_empty());
        assert_eq!(vertices[0].position, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(vertices[0].color, Vec3::new(0.5, 0.0, 0.5));
    }

    #[test]
    fn test_points_outside_grid_are_discarded() {
        // Extent 2.5 gives a width of 2: x = 2.5 truncates to 2 and is dropped.
        let pts = vec![
            point(0.0, 1.0, 0.0),
            point(2.5, 1.0, 0.0),
            point(0.0, 1.0, 3.0),
        ];
        let grid = HeightGrid::build(&pts, &bounds(2.5, 1.0, 1.0), LIMIT).unwrap();
        assert_eq!((grid.width(), grid.depth()), (2, 1));
        let total: u32 = (0..2).map(|x| grid.cell(x, 0).count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_unit_square_gives_single_cell() {
        let pts = vec![
            point(0.0, 0.0, 0.0),
            point(1.0, 1.0, 0.0),
            point(0.0, 1.0, 1.0),
            point(1.0, 0.0, 1.0),
        ];
        let grid = HeightGrid::build(&pts, &bounds(1.0, 1.0, 1.0), LIMIT).unwrap();
        assert_eq!((grid.width(), grid.depth()), (1, 1));
        let (vertices, holes) = grid.assemble(1.0);
        assert_eq!(vertices.len(), 1);
        assert!(holes.is_empty());
    }

    #[test]
    fn test_empty_cells_are_sentinel_holes() {
        let pts = vec![point(0.5, 2.0, 0.5)];
        let grid = HeightGrid::build(&pts, &bounds(2.0, 4.0, 2.0), LIMIT).unwrap();
        let (vertices, holes) = grid.assemble(4.0);
        assert_eq!(holes, vec![(1, 0), (0, 1), (1, 1)]);
        for &(x, z) in &holes {
            let v = vertices[x + 2 * z];
            assert_eq!(v.position.y, -4.0);
            assert_eq!(v.color, WHITE);
        }
    }

    #[test]
    fn test_interior_hole_takes_neighbour_mean() {
        let height = |x: usize, z: usize| (x + 3 * z) as f32;
        let pts = grid_points(3, 3, &[(1, 1)], height);
        let grid = HeightGrid::build(&pts, &bounds(3.0, 8.0, 3.0), LIMIT).unwrap();
        let (mut vertices, holes) = grid.assemble(8.0);
        assert_eq!(holes, vec![(1, 1)]);

        let filled = fill_holes(&mut vertices, 3, 3, &holes, HoleFillMode::Sequential);
        assert_eq!(filled, 1);

        let neighbour_mean = [0, 1, 2, 3, 5, 6, 7, 8]
            .iter()
            .map(|&h| h as f32 - 8.0)
            .sum::<f32>()
            / 8.0;
        assert!((vertices[4].position.y - neighbour_mean).abs() < 1e-5);
        assert!((vertices[4].color - GREEN).length() < 1e-6);
    }

    #[test]
    fn test_border_holes_keep_sentinel() {
        let pts = grid_points(4, 4, &[(0, 2), (3, 3), (2, 0)], |_, _| 1.0);
        let grid = HeightGrid::build(&pts, &bounds(4.0, 2.0, 4.0), LIMIT).unwrap();
        let (mut vertices, holes) = grid.assemble(2.0);
        assert_eq!(fill_holes(&mut vertices, 4, 4, &holes, HoleFillMode::Sequential), 0);
        for &(x, z) in &holes {
            assert_eq!(vertices[x + 4 * z].position.y, -2.0);
        }
    }

    #[test]
    fn test_fill_order_matters_only_in_sequential_mode() {
        // Two adjacent interior holes at (1,1) and (2,1) in a 4x3 grid.
        let pts = grid_points(4, 3, &[(1, 1), (2, 1)], |_, _| 8.0);
        let grid = HeightGrid::build(&pts, &bounds(4.0, 8.0, 3.0), LIMIT).unwrap();
        let (vertices, holes) = grid.assemble(8.0);

        let mut sequential = vertices.clone();
        fill_holes(&mut sequential, 4, 3, &holes, HoleFillMode::Sequential);
        let mut snapshot = vertices.clone();
        fill_holes(&mut snapshot, 4, 3, &holes, HoleFillMode::Snapshot);

        // Populated cells sit at 0 (8 - max_y), holes at the -8 sentinel.
        // First hole sees one sentinel neighbour in both modes.
        assert_eq!(sequential[5].position.y, -1.0);
        assert_eq!(snapshot[5].position.y, -1.0);
        // Second hole sees the filled first hole only in sequential mode.
        assert_eq!(sequential[6].position.y, -1.0 / 8.0);
        assert_eq!(snapshot[6].position.y, -1.0);
    }
}
