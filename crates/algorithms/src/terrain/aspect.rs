//! Aspect from DEMs
//!
//! Compass direction of steepest descent using Horn's (1981) gradients.

use firerisk_core::{Raster, Result};
use std::f64::consts::PI;

use super::{horn_gradient, Spacing};
use crate::maybe_rayon::*;

/// Gradients below this magnitude are treated as flat
const FLAT_THRESHOLD: f64 = 1e-10;

/// Aspect in degrees, clockwise from north:
/// - 0° = North
/// - 90° = East
/// - 180° = South
/// - 270° = West
///
/// Flat, border and no-data cells are NaN.
pub fn aspect(dem: &Raster, spacing: Spacing) -> Result<Raster> {
    let (rows, cols) = dem.shape();

    let output: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| match horn_gradient(dem, row, col, spacing) {
                    Some((dz_dx, dz_dy))
                        if dz_dx.abs() >= FLAT_THRESHOLD || dz_dy.abs() >= FLAT_THRESHOLD =>
                    {
                        // Descent direction in (east, north): east = -dz/dx, and
                        // north = dz/dy because rows grow southward.
                        let bearing = (-dz_dx).atan2(dz_dy);
                        let bearing = if bearing < 0.0 { bearing + 2.0 * PI } else { bearing };
                        bearing.to_degrees()
                    }
                    _ => f64::NAN,
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    let array = ndarray::Array2::from_shape_vec((rows, cols), output)
        .map_err(|e| firerisk_core::Error::Other(e.to_string()))?;
    dem.with_data(array)
}
