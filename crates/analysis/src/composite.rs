//! Weighted combination of the normalised signals into the risk index.

use firerisk_core::Image;

use crate::normalize::Normalized;
use crate::signals::Signal;

pub const LST_WEIGHT: f64 = 0.30;
pub const NDVI_WEIGHT: f64 = -0.30;
pub const SLOPE_WEIGHT: f64 = 0.15;
pub const ASPECT_WEIGHT: f64 = 0.15;
pub const PRECIP_WEIGHT: f64 = -0.10;

/// Fire risk index:
///
/// ```text
/// 0.30·LST − 0.30·NDVI + 0.15·Slope + 0.15·AspectSouth − 0.10·Precip
/// ```
///
/// The sum is not rescaled afterwards, so values range over [-0.55, 0.60].
pub fn fire_risk(inputs: &Normalized) -> Image {
    inputs
        .lst
        .clone()
        .multiply(LST_WEIGHT)
        .add(inputs.ndvi.clone().multiply(NDVI_WEIGHT))
        .add(inputs.slope.clone().multiply(SLOPE_WEIGHT))
        .add(inputs.aspect_south.clone().multiply(ASPECT_WEIGHT))
        .add(inputs.precip.clone().multiply(PRECIP_WEIGHT))
        .rename(Signal::FireRisk.name())
}
