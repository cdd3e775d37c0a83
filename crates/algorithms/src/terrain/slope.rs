//! Slope from DEMs
//!
//! Rate of change of elevation with Horn's (1981) 3x3 finite differences.

use firerisk_core::{Raster, Result};

use super::{horn_gradient, Spacing};
use crate::maybe_rayon::*;

/// Slope in degrees (0-90)
///
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
///
/// dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * dx)
/// dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * dy)
/// slope = atan(sqrt(dz/dx² + dz/dy²))
///
/// Border cells and cells with a no-data neighbour are NaN. For geographic
/// grids `spacing` converts degree cells to meters.
pub fn slope(dem: &Raster, spacing: Spacing) -> Result<Raster> {
    let (rows, cols) = dem.shape();

    let output: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| match horn_gradient(dem, row, col, spacing) {
                    Some((dz_dx, dz_dy)) => (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan().to_degrees(),
                    None => f64::NAN,
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    let array = ndarray::Array2::from_shape_vec((rows, cols), output)
        .map_err(|e| firerisk_core::Error::Other(e.to_string()))?;
    dem.with_data(array)
}
