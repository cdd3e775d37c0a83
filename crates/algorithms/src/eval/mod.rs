//! Local evaluation of image expressions.
//!
//! [`Evaluator`] renders an [`Image`] graph onto a fixed [`GridLayout`],
//! reading collections and assets from a [`CollectionStore`]. Every catalog
//! band must already be on the evaluator's grid; no resampling is done.
//!
//! Band naming follows the remote backend: constants produce `constant`,
//! normalized differences produce `nd`, terrain products produce `slope` or
//! `aspect`, and binary operations keep the names of the wider operand.

mod catalog;

pub use catalog::{CatalogImage, CollectionStore, MemoryCatalog};

use crate::imagery::{band_math, band_math_binary, clamp, normalized_difference, unit_scale};
use crate::reduce::reduce_stack;
use crate::terrain::{aspect, slope, Spacing};
use firerisk_core::expr::{BinaryOp, Filter};
use firerisk_core::{
    Collection, Coordinate, Error, Geometry, GridLayout, Image, Raster, Reducer, Result,
    TerrainProduct,
};
use tracing::debug;

/// A named raster band.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub raster: Raster,
}

impl Band {
    pub fn new(name: &str, raster: Raster) -> Self {
        Self {
            name: name.to_string(),
            raster,
        }
    }
}

/// The materialised result of an expression: zero or more bands on one grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageData {
    bands: Vec<Band>,
}

impl ImageData {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// An image with no bands, as produced by reducing an empty collection
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Result<&Raster> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.raster)
            .ok_or_else(|| Error::BandNotFound(name.to_string()))
    }

    /// The only band of a single-band image
    pub fn single(&self) -> Result<&Raster> {
        match self.bands.as_slice() {
            [band] => Ok(&band.raster),
            _ => Err(Error::BandMismatch {
                left: self.bands.len(),
                right: 1,
            }),
        }
    }

    pub fn into_bands(self) -> Vec<Band> {
        self.bands
    }

    fn map_bands<F>(self, f: F) -> Result<Self>
    where
        F: Fn(&Raster) -> Result<Raster>,
    {
        let bands = self
            .bands
            .into_iter()
            .map(|b| Ok(Band::new(&b.name, f(&b.raster)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bands })
    }
}

/// Renders image expressions onto a grid.
pub struct Evaluator<'a, S: CollectionStore> {
    store: &'a S,
    layout: GridLayout,
}

impl<'a, S: CollectionStore> Evaluator<'a, S> {
    pub fn new(store: &'a S, layout: GridLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Evaluate `image` to its bands
    pub fn evaluate(&self, image: &Image) -> Result<ImageData> {
        match image {
            Image::Constant { value } => Ok(ImageData::new(vec![Band::new(
                "constant",
                self.layout.raster(*value),
            )])),

            Image::Asset { id } => {
                let asset = self
                    .store
                    .asset(id)
                    .ok_or_else(|| Error::UnknownAsset(id.clone()))?;
                for band in &asset.bands {
                    self.check_grid(&band.raster)?;
                }
                Ok(ImageData::new(asset.bands.clone()))
            }

            Image::Reduce {
                collection,
                reducer,
            } => self.reduce(collection, *reducer),

            Image::Select { input, bands } => {
                let data = self.evaluate(input)?;
                let selected = bands
                    .iter()
                    .map(|name| Ok(Band::new(name, data.band(name)?.clone())))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ImageData::new(selected))
            }

            Image::Rename { input, names } => {
                let data = self.evaluate(input)?;
                if data.band_count() != names.len() {
                    return Err(Error::BandMismatch {
                        left: data.band_count(),
                        right: names.len(),
                    });
                }
                let bands = data
                    .into_bands()
                    .into_iter()
                    .zip(names)
                    .map(|(band, name)| Band::new(name, band.raster))
                    .collect();
                Ok(ImageData::new(bands))
            }

            Image::NormalizedDifference {
                input,
                bands: [a, b],
            } => {
                let data = self.evaluate(input)?;
                let nd = normalized_difference(data.band(a)?, data.band(b)?)?;
                Ok(ImageData::new(vec![Band::new("nd", nd)]))
            }

            Image::Binary {
                operator,
                left,
                right,
            } => self.binary(*operator, self.evaluate(left)?, self.evaluate(right)?),

            Image::Unary { operator, input } => {
                let op = *operator;
                self.evaluate(input)?
                    .map_bands(|r| Ok(band_math(r, |v| op.apply(v))))
            }

            Image::UnitScale { input, low, high } => self
                .evaluate(input)?
                .map_bands(|r| unit_scale(r, *low, *high)),

            Image::Clamp { input, low, high } => self
                .evaluate(input)?
                .map_bands(|r| Ok(clamp(r, *low, *high))),

            Image::Clip { input, geometry } => self
                .evaluate(input)?
                .map_bands(|r| Ok(self.clip(r, geometry))),

            Image::Terrain { input, product } => {
                let data = self.evaluate(input)?;
                let dem = data.single()?;
                let spacing = Spacing::for_layout(&self.layout);
                let band = match product {
                    TerrainProduct::Slope => Band::new("slope", slope(dem, spacing)?),
                    TerrainProduct::Aspect => Band::new("aspect", aspect(dem, spacing)?),
                };
                Ok(ImageData::new(vec![band]))
            }

            Image::IfHasBands {
                test,
                then,
                otherwise,
            } => {
                let probe = self.evaluate(test)?;
                let branch = if probe.band_count() > 0 { then } else { otherwise };
                debug!(bands = probe.band_count(), "conditional on band presence");
                self.evaluate(branch)
            }
        }
    }

    fn reduce(&self, collection: &Collection, reducer: Reducer) -> Result<ImageData> {
        let matched: Vec<_> = self
            .store
            .collection(&collection.id)
            .iter()
            .filter(|img| collection.filters.iter().all(|f| matches_filter(img, f)))
            .collect();
        debug!(
            collection = %collection.id,
            matched = matched.len(),
            ?reducer,
            "reducing collection"
        );

        let Some(first) = matched.first() else {
            return Ok(ImageData::empty());
        };

        let names: Vec<String> = match &collection.bands {
            Some(bands) => bands.clone(),
            None => first.bands.iter().map(|b| b.name.clone()).collect(),
        };

        let mut out = Vec::with_capacity(names.len());
        for name in &names {
            let stack = matched
                .iter()
                .map(|img| {
                    img.bands
                        .iter()
                        .find(|b| &b.name == name)
                        .map(|b| &b.raster)
                        .ok_or_else(|| Error::BandNotFound(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;
            for raster in &stack {
                self.check_grid(raster)?;
            }
            out.push(Band::new(name, reduce_stack(&stack, reducer)?));
        }
        Ok(ImageData::new(out))
    }

    fn binary(&self, op: BinaryOp, left: ImageData, right: ImageData) -> Result<ImageData> {
        let (l, r) = (left.band_count(), right.band_count());
        let bands = if l == r {
            left.bands
                .iter()
                .zip(&right.bands)
                .map(|(a, b)| Ok(Band::new(&a.name, band_math_binary(&a.raster, &b.raster, op)?)))
                .collect::<Result<Vec<_>>>()?
        } else if r == 1 {
            let b = &right.bands[0].raster;
            left.bands
                .iter()
                .map(|a| Ok(Band::new(&a.name, band_math_binary(&a.raster, b, op)?)))
                .collect::<Result<Vec<_>>>()?
        } else if l == 1 {
            let a = &left.bands[0].raster;
            right
                .bands
                .iter()
                .map(|b| Ok(Band::new(&b.name, band_math_binary(a, &b.raster, op)?)))
                .collect::<Result<Vec<_>>>()?
        } else {
            return Err(Error::BandMismatch { left: l, right: r });
        };
        Ok(ImageData::new(bands))
    }

    /// Mask cells whose centre falls outside `geometry`
    fn clip(&self, raster: &Raster, geometry: &Geometry) -> Raster {
        let transform = self.layout.transform;
        let mut out = raster.clone();
        for ((row, col), cell) in out.data_mut().indexed_iter_mut() {
            let (x, y) = transform.pixel_to_geo(col, row);
            if !geometry.contains(Coordinate::new(x, y)) {
                *cell = f64::NAN;
            }
        }
        out
    }

    fn check_grid(&self, raster: &Raster) -> Result<()> {
        if raster.shape() != self.layout.shape() {
            return Err(Error::SizeMismatch {
                er: self.layout.rows,
                ec: self.layout.cols,
                ar: raster.rows(),
                ac: raster.cols(),
            });
        }
        Ok(())
    }
}

fn matches_filter(image: &CatalogImage, filter: &Filter) -> bool {
    match filter {
        Filter::Bounds { geometry } => image.footprint.intersects(&geometry.bounds()),
        Filter::Date { window } => window.contains(image.date),
        Filter::PropertyLessThan { property, value } => image
            .properties
            .get(property)
            .is_some_and(|v| v < value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use firerisk_core::{BBox, GeoTransform, TimeWindow};

    fn layout() -> GridLayout {
        GridLayout::new(GeoTransform::new(0.0, 4.0, 1.0, -1.0), 4, 4)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, d).unwrap()
    }

    fn image(d: u32, cloud: f64, value: f64) -> CatalogImage {
        CatalogImage::new(day(d), BBox::new(0.0, 0.0, 4.0, 4.0))
            .with_property("CLOUDY", cloud)
            .with_band("v", layout().raster(value))
    }

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .insert_image("C", image(1, 5.0, 1.0))
            .insert_image("C", image(2, 50.0, 100.0))
            .insert_image("C", image(3, 2.0, 3.0))
            .insert_image("C", image(20, 1.0, 7.0));
        catalog
    }

    #[test]
    fn reduce_applies_filters() {
        let catalog = catalog();
        let eval = Evaluator::new(&catalog, layout());
        let window = TimeWindow::parse("2023-07-01", "2023-07-10").unwrap();
        let img = Collection::load("C").filter_date(window).filter_lt("CLOUDY", 10.0).mean();
        let data = eval.evaluate(&img).unwrap();
        assert_eq!(data.names(), vec!["v"]);
        assert_relative_eq!(data.band("v").unwrap().get(2, 2).unwrap(), 2.0);
    }

    #[test]
    fn empty_collection_has_no_bands_and_falls_back() {
        let catalog = catalog();
        let eval = Evaluator::new(&catalog, layout());
        let window = TimeWindow::parse("2024-01-01", "2024-02-01").unwrap();
        let reduced = Collection::load("C").filter_date(window).median();
        assert_eq!(eval.evaluate(&reduced).unwrap().band_count(), 0);

        let guarded = Image::if_has_bands(
            reduced.clone(),
            reduced.select(&["v"]).rename("x"),
            Image::constant(10.0).rename("x"),
        );
        let data = eval.evaluate(&guarded).unwrap();
        assert_eq!(data.band("x").unwrap().get(0, 0).unwrap(), 10.0);
    }

    #[test]
    fn binary_broadcasts_single_band() {
        let catalog = catalog();
        let eval = Evaluator::new(&catalog, layout());
        let img = Image::constant(3.0).multiply(0.5).subtract(Image::constant(1.0));
        let data = eval.evaluate(&img).unwrap();
        assert_eq!(data.single().unwrap().get(1, 1).unwrap(), 0.5);
    }

    #[test]
    fn rename_requires_matching_count() {
        let catalog = MemoryCatalog::new();
        let eval = Evaluator::new(&catalog, layout());
        let img = Image::Rename {
            input: Box::new(Image::constant(1.0)),
            names: vec!["a".into(), "b".into()],
        };
        assert!(matches!(eval.evaluate(&img), Err(Error::BandMismatch { .. })));
    }

    #[test]
    fn clip_masks_outside_cells() {
        let catalog = MemoryCatalog::new();
        let eval = Evaluator::new(&catalog, layout());
        let rect = Geometry::rectangle(&BBox::new(0.0, 2.0, 2.0, 4.0));
        let data = eval.evaluate(&Image::constant(1.0).clip(rect)).unwrap();
        let r = data.single().unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 1.0);
        assert!(r.get(3, 3).unwrap().is_nan());
    }

    #[test]
    fn unknown_asset_is_an_error() {
        let catalog = MemoryCatalog::new();
        let eval = Evaluator::new(&catalog, layout());
        assert!(matches!(
            eval.evaluate(&Image::asset("missing")),
            Err(Error::UnknownAsset(_))
        ));
    }
}
