//! Imagery operations: band math, spectral indices, rescaling

mod band_math;
mod indices;
mod rescale;

pub use band_math::{band_math, band_math_binary};
pub use indices::{ndvi, normalized_difference};
pub use rescale::{clamp, unit_scale};
