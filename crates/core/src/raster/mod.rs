//! Raster data structures and operations

mod geotransform;
mod grid;
mod layout;

pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use layout::GridLayout;
