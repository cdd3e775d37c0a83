//! In-memory image catalogs for local evaluation

use super::Band;
use chrono::NaiveDate;
use firerisk_core::{BBox, Raster};
use std::collections::HashMap;

/// One stored image: acquisition date, footprint, numeric metadata and bands.
#[derive(Debug, Clone)]
pub struct CatalogImage {
    pub date: NaiveDate,
    pub footprint: BBox,
    pub properties: HashMap<String, f64>,
    pub bands: Vec<Band>,
}

impl CatalogImage {
    pub fn new(date: NaiveDate, footprint: BBox) -> Self {
        Self {
            date,
            footprint,
            properties: HashMap::new(),
            bands: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: f64) -> Self {
        self.properties.insert(name.to_string(), value);
        self
    }

    pub fn with_band(mut self, name: &str, raster: Raster) -> Self {
        self.bands.push(Band::new(name, raster));
        self
    }
}

/// Source of collections and single assets for the evaluator.
pub trait CollectionStore {
    /// Every image of a collection, empty for unknown ids
    fn collection(&self, id: &str) -> &[CatalogImage];

    fn asset(&self, id: &str) -> Option<&CatalogImage>;
}

/// A [`CollectionStore`] held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    collections: HashMap<String, Vec<CatalogImage>>,
    assets: HashMap<String, CatalogImage>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image to collection `id`
    pub fn insert_image(&mut self, id: &str, image: CatalogImage) -> &mut Self {
        self.collections.entry(id.to_string()).or_default().push(image);
        self
    }

    pub fn insert_asset(&mut self, id: &str, image: CatalogImage) -> &mut Self {
        self.assets.insert(id.to_string(), image);
        self
    }
}

impl CollectionStore for MemoryCatalog {
    fn collection(&self, id: &str) -> &[CatalogImage] {
        self.collections.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn asset(&self, id: &str) -> Option<&CatalogImage> {
        self.assets.get(id)
    }
}
