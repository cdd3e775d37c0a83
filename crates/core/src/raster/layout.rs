//! Target grid shared by every band of an evaluation

use crate::crs::CRS;
use crate::geometry::BBox;
use crate::raster::{GeoTransform, Raster};

/// Dimensions and georeferencing of the grid an image is rendered onto.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
    pub crs: Option<CRS>,
}

impl GridLayout {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        Self {
            transform,
            rows,
            cols,
            crs: None,
        }
    }

    /// Smallest north-up grid with `pixel_size` cells covering `bbox`.
    ///
    /// The grid is anchored at the upper-left corner of the box and always
    /// has at least one cell.
    pub fn covering(bbox: &BBox, pixel_size: f64) -> Self {
        let cols = ((bbox.width() / pixel_size).ceil() as usize).max(1);
        let rows = ((bbox.height() / pixel_size).ceil() as usize).max(1);
        Self {
            transform: GeoTransform::new(bbox.min_x, bbox.max_y, pixel_size, -pixel_size),
            rows,
            cols,
            crs: Some(CRS::wgs84()),
        }
    }

    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// A raster on this grid with every cell set to `value`
    pub fn raster(&self, value: f64) -> Raster {
        Raster::filled(self.rows, self.cols, value)
            .with_transform(self.transform)
            .with_crs(self.crs.clone())
    }

    /// Whether the grid is in geographic (degree) units
    pub fn is_geographic(&self) -> bool {
        self.crs.as_ref().is_some_and(CRS::is_geographic)
    }
}
