//! Normalized-difference spectral indices

use firerisk_core::{Raster, Result};

/// `(band_a - band_b) / (band_a + band_b)`, in [-1, 1].
///
/// Pixels where the bands sum to zero, or either band is no-data, are NaN.
pub fn normalized_difference(band_a: &Raster, band_b: &Raster) -> Result<Raster> {
    band_a.zip_with(band_b, |a, b| {
        let sum = a + b;
        if sum.abs() < 1e-10 {
            f64::NAN
        } else {
            (a - b) / sum
        }
    })
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// - Dense vegetation: 0.6 to 0.9
/// - Sparse vegetation: 0.2 to 0.5
/// - Bare soil: 0.1 to 0.2
/// - Water/clouds: below 0
pub fn ndvi(nir: &Raster, red: &Raster) -> Result<Raster> {
    normalized_difference(nir, red)
}
