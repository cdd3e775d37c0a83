//! Fixed-range normalisation of the raw signals.

use std::f64::consts::PI;

use firerisk_core::Image;

use crate::signals::{Signal, Signals};

/// Value range mapped onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

pub const NDVI_RANGE: Range = Range { min: 0.0, max: 1.0 };
/// °C
pub const LST_RANGE: Range = Range { min: 20.0, max: 45.0 };
/// Degrees
pub const SLOPE_RANGE: Range = Range { min: 0.0, max: 60.0 };
/// mm
pub const PRECIP_RANGE: Range = Range { min: 0.0, max: 150.0 };

/// `(v - min) / (max - min)` clamped to [0, 1]
pub fn normalize(image: Image, range: Range) -> Image {
    image.unit_scale(range.min, range.max).clamp(0.0, 1.0)
}

/// `cos((aspect - 180) * π / 180)`: 1 facing south, -1 facing north.
/// Already in [-1, 1], so not clamped.
pub fn aspect_south_score(aspect: Image) -> Image {
    aspect
        .subtract(180.0)
        .multiply(PI / 180.0)
        .cos()
        .rename(Signal::AspectScore.name())
}

/// Signals on a common scale, ready for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub ndvi: Image,
    pub lst: Image,
    pub slope: Image,
    pub precip: Image,
    pub aspect_south: Image,
}

impl Normalized {
    /// Normalise every signal; `signals` is left intact for export
    pub fn from_signals(signals: &Signals) -> Self {
        Self {
            ndvi: normalize(signals.ndvi.clone(), NDVI_RANGE),
            lst: normalize(signals.lst.clone(), LST_RANGE),
            slope: normalize(signals.slope.clone(), SLOPE_RANGE),
            precip: normalize(signals.precip.clone(), PRECIP_RANGE),
            aspect_south: aspect_south_score(signals.aspect.clone()),
        }
    }
}
