//! # FireRisk Algorithms
//!
//! Local raster kernels for the FireRisk pipeline.
//!
//! ## Modules
//!
//! - **terrain**: Horn slope and aspect
//! - **imagery**: Band math, normalized difference, rescaling
//! - **reduce**: Per-pixel median, mean and sum over image stacks
//! - **eval**: Evaluation of `firerisk_core::Image` expressions on a grid

pub mod eval;
pub mod imagery;
pub(crate) mod maybe_rayon;
pub mod reduce;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::eval::{Band, CatalogImage, CollectionStore, Evaluator, ImageData, MemoryCatalog};
    pub use crate::imagery::{band_math, band_math_binary, clamp, ndvi, normalized_difference, unit_scale};
    pub use crate::reduce::reduce_stack;
    pub use crate::terrain::{aspect, slope, Spacing};
    pub use firerisk_core::prelude::*;
}
