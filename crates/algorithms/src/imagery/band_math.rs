//! Band math operations
//!
//! Raster algebra: apply a function to one raster, or an operator to two
//! rasters, cell by cell.

use firerisk_core::expr::BinaryOp;
use firerisk_core::{Raster, Result};

/// Divisors smaller than this produce no-data
const DIVISION_EPSILON: f64 = 1e-10;

/// Apply a unary function to every valid cell. NaN cells are preserved.
///
/// # Example
/// ```ignore
/// let celsius = band_math(&lst_raw, |v| v * 0.02 - 273.15);
/// ```
pub fn band_math<F>(raster: &Raster, f: F) -> Raster
where
    F: Fn(f64) -> f64,
{
    raster.map(f)
}

/// Apply a binary operator between two rasters of equal shape.
///
/// No-data in either input, or division by (near) zero, yields NaN.
pub fn band_math_binary(a: &Raster, b: &Raster, op: BinaryOp) -> Result<Raster> {
    a.zip_with(b, |va, vb| match op {
        BinaryOp::Divide if vb.abs() < DIVISION_EPSILON => f64::NAN,
        _ => op.apply(va, vb),
    })
}
