//! Terrain derivatives: slope and aspect

mod aspect;
mod slope;

pub use aspect::aspect;
pub use slope::slope;

use firerisk_core::{GridLayout, Raster};

/// Approximate ground length of one degree of latitude, in meters
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Ground distance between neighbouring cell centres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub dx: f64,
    pub dy: f64,
}

impl Spacing {
    pub fn uniform(cell_size: f64) -> Self {
        Self {
            dx: cell_size,
            dy: cell_size,
        }
    }

    /// Spacing for a grid, converting degree cells to meters at the grid's
    /// central latitude when the grid is geographic
    pub fn for_layout(layout: &GridLayout) -> Self {
        let cell = layout.transform.cell_size();
        if !layout.is_geographic() {
            return Self::uniform(cell);
        }
        let (_, min_y, _, max_y) = layout.transform.bounds(layout.cols, layout.rows);
        let mid_lat = ((min_y + max_y) / 2.0).to_radians();
        Self {
            dx: cell * METERS_PER_DEGREE * mid_lat.cos(),
            dy: cell * METERS_PER_DEGREE,
        }
    }
}

/// Horn partial derivatives (dz/dx, dz/dy) at an interior cell.
///
/// `None` on the border or when any cell of the 3x3 window is NaN.
pub(crate) fn horn_gradient(dem: &Raster, row: usize, col: usize, spacing: Spacing) -> Option<(f64, f64)> {
    let (rows, cols) = dem.shape();
    if row == 0 || col == 0 || row + 1 >= rows || col + 1 >= cols {
        return None;
    }

    let data = dem.data();
    let z = |r: usize, c: usize| data[(r, c)];
    let (a, b, c) = (z(row - 1, col - 1), z(row - 1, col), z(row - 1, col + 1));
    let (d, e, f) = (z(row, col - 1), z(row, col), z(row, col + 1));
    let (g, h, i) = (z(row + 1, col - 1), z(row + 1, col), z(row + 1, col + 1));

    if [a, b, c, d, e, f, g, h, i].iter().any(|v| v.is_nan()) {
        return None;
    }

    let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * spacing.dx);
    let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * spacing.dy);
    Some((dz_dx, dz_dy))
}
