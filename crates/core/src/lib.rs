//! # FireRisk Core
//!
//! Shared types for the FireRisk wildfire-risk pipeline.
//!
//! This crate provides:
//! - `Raster`: georeferenced single-band grid
//! - `GeoTransform` / `GridLayout`: georeferencing
//! - `Coordinate`, `BBox`, `Region`: analysis geometry
//! - `TimeWindow`: date ranges for collection queries
//! - `Image`: lazy, serialisable image expressions evaluated by the backend
//!
//! `Raster`, the georeferencing types and `CRS` need the `raster` feature.

#[cfg(feature = "raster")]
pub mod crs;
pub mod error;
pub mod expr;
pub mod geometry;
#[cfg(feature = "raster")]
pub mod raster;
pub mod time;

#[cfg(feature = "raster")]
pub use crs::CRS;
pub use error::{Error, Result};
pub use expr::{Collection, Geometry, Image, Reducer, TerrainProduct};
pub use geometry::{BBox, Coordinate, Region, DEFAULT_BUFFER_METERS};
#[cfg(feature = "raster")]
pub use raster::{GeoTransform, GridLayout, Raster};
pub use time::TimeWindow;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::expr::{Collection, Geometry, Image, Reducer, TerrainProduct};
    pub use crate::geometry::{BBox, Coordinate, Region};
    #[cfg(feature = "raster")]
    pub use crate::raster::{GeoTransform, GridLayout, Raster};
    pub use crate::time::TimeWindow;
    #[cfg(feature = "raster")]
    pub use crate::CRS;
}
