//! Linear rescaling and clamping

use firerisk_core::{Error, Raster, Result};

/// Map `low` to 0 and `high` to 1 linearly. Values outside the range
/// extrapolate; pair with [`clamp`] to bound them.
pub fn unit_scale(raster: &Raster, low: f64, high: f64) -> Result<Raster> {
    let span = high - low;
    if span == 0.0 || !span.is_finite() {
        return Err(Error::InvalidParameter {
            name: "unit_scale",
            value: format!("[{low}, {high}]"),
            reason: "range must be finite and non-empty".into(),
        });
    }
    Ok(raster.map(|v| (v - low) / span))
}

/// Limit every valid cell to `[low, high]`
pub fn clamp(raster: &Raster, low: f64, high: f64) -> Raster {
    raster.map(|v| v.clamp(low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_scale_maps_bounds() {
        let r = Raster::from_vec(vec![20.0, 32.5, 45.0, 70.0], 2, 2).unwrap();
        let scaled = unit_scale(&r, 20.0, 45.0).unwrap();
        assert_eq!(scaled.get(0, 0).unwrap(), 0.0);
        assert_eq!(scaled.get(0, 1).unwrap(), 0.5);
        assert_eq!(scaled.get(1, 0).unwrap(), 1.0);
        assert_eq!(scaled.get(1, 1).unwrap(), 2.0);
        assert_eq!(clamp(&scaled, 0.0, 1.0).get(1, 1).unwrap(), 1.0);
    }

    #[test]
    fn unit_scale_rejects_empty_range() {
        assert!(unit_scale(&Raster::new(1, 1), 3.0, 3.0).is_err());
    }
}
