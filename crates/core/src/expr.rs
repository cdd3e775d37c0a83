//! Lazy image expressions.
//!
//! An [`Image`] is a description of a raster computation, not its pixels.
//! The pipeline assembles expressions with the fluent builders below and
//! hands them to the remote backend, which evaluates them server-side at
//! export time. The same graph can be evaluated locally (see
//! `firerisk_algorithms::eval`).
//!
//! Expressions serialise to JSON with an `"op"` tag per node:
//!
//! ```text
//! {"op":"unit_scale","input":{"op":"constant","value":25.0},"low":20.0,"high":45.0}
//! ```

use crate::error::Result;
use crate::geometry::{BBox, Coordinate, Region};
use crate::time::TimeWindow;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Spatial operand of filters, clips and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// `[lon, lat]`
    Point { coordinates: [f64; 2] },
    /// Geodesic disk around `[lon, lat]`
    Buffer { center: [f64; 2], radius_m: f64 },
    /// `[west, south, east, north]`
    Rectangle { bbox: [f64; 4] },
}

impl Geometry {
    pub fn point(c: Coordinate) -> Self {
        Self::Point {
            coordinates: [c.lon, c.lat],
        }
    }

    pub fn rectangle(bbox: &BBox) -> Self {
        Self::Rectangle {
            bbox: bbox.to_array(),
        }
    }

    /// Bounding box of the geometry
    pub fn bounds(&self) -> BBox {
        match self {
            Self::Point { coordinates: [x, y] } => BBox::new(*x, *y, *x, *y),
            Self::Buffer {
                center: [lon, lat],
                radius_m,
            } => Region::buffer(Coordinate::new(*lon, *lat), *radius_m).bounds(),
            Self::Rectangle { bbox: [w, s, e, n] } => BBox::new(*w, *s, *e, *n),
        }
    }

    /// Whether the geometry covers `c`
    pub fn contains(&self, c: Coordinate) -> bool {
        match self {
            Self::Buffer {
                center: [lon, lat],
                radius_m,
            } => Region::buffer(Coordinate::new(*lon, *lat), *radius_m).contains(c),
            _ => self.bounds().contains(c),
        }
    }
}

impl From<&Region> for Geometry {
    fn from(region: &Region) -> Self {
        let c = region.center();
        Self::Buffer {
            center: [c.lon, c.lat],
            radius_m: region.radius_m(),
        }
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// Predicate applied to the images of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Image footprint intersects the geometry
    Bounds { geometry: Geometry },
    /// Acquisition date inside the window (end exclusive)
    Date { window: TimeWindow },
    /// Numeric image property strictly below `value`
    PropertyLessThan { property: String, value: f64 },
}

/// Per-pixel reduction of an image stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Median,
    Mean,
    Sum,
}

/// A filtered remote image collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
    /// Band subset, all bands when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<String>>,
}

impl Collection {
    /// Open a named collection
    pub fn load(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            filters: Vec::new(),
            bands: None,
        }
    }

    pub fn filter_bounds(mut self, geometry: Geometry) -> Self {
        self.filters.push(Filter::Bounds { geometry });
        self
    }

    pub fn filter_date(mut self, window: TimeWindow) -> Self {
        self.filters.push(Filter::Date { window });
        self
    }

    pub fn filter_lt(mut self, property: impl Into<String>, value: f64) -> Self {
        self.filters.push(Filter::PropertyLessThan {
            property: property.into(),
            value,
        });
        self
    }

    pub fn select(mut self, bands: &[&str]) -> Self {
        self.bands = Some(bands.iter().map(|b| b.to_string()).collect());
        self
    }

    pub fn reduce(self, reducer: Reducer) -> Image {
        Image::Reduce {
            collection: self,
            reducer,
        }
    }

    pub fn median(self) -> Image {
        self.reduce(Reducer::Median)
    }

    pub fn mean(self) -> Image {
        self.reduce(Reducer::Mean)
    }

    pub fn sum(self) -> Image {
        self.reduce(Reducer::Sum)
    }
}

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Subtract => a - b,
            Self::Multiply => a * b,
            Self::Divide => a / b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Cos,
    Sin,
    Abs,
    Sqrt,
}

impl UnaryOp {
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Self::Cos => v.cos(),
            Self::Sin => v.sin(),
            Self::Abs => v.abs(),
            Self::Sqrt => v.sqrt(),
        }
    }
}

/// Terrain derivative of an elevation image, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainProduct {
    Slope,
    Aspect,
}

/// A lazily evaluated raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Image {
    /// One band, every pixel `value`
    Constant { value: f64 },
    /// A single stored image
    Asset { id: String },
    /// Per-pixel reduction of a collection; zero bands when nothing matched
    Reduce {
        collection: Collection,
        reducer: Reducer,
    },
    Select {
        input: Box<Image>,
        bands: Vec<String>,
    },
    Rename {
        input: Box<Image>,
        names: Vec<String>,
    },
    /// `(a - b) / (a + b)` of two bands
    NormalizedDifference {
        input: Box<Image>,
        bands: [String; 2],
    },
    Binary {
        operator: BinaryOp,
        left: Box<Image>,
        right: Box<Image>,
    },
    Unary {
        operator: UnaryOp,
        input: Box<Image>,
    },
    /// Linear rescale mapping `low` to 0 and `high` to 1
    UnitScale {
        input: Box<Image>,
        low: f64,
        high: f64,
    },
    Clamp {
        input: Box<Image>,
        low: f64,
        high: f64,
    },
    /// Mask pixels outside `geometry`
    Clip {
        input: Box<Image>,
        geometry: Geometry,
    },
    Terrain {
        input: Box<Image>,
        product: TerrainProduct,
    },
    /// `then` if `test` has at least one band, `otherwise` if not
    IfHasBands {
        test: Box<Image>,
        then: Box<Image>,
        otherwise: Box<Image>,
    },
}

impl From<f64> for Image {
    fn from(value: f64) -> Self {
        Image::constant(value)
    }
}

impl Image {
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    pub fn asset(id: impl Into<String>) -> Self {
        Self::Asset { id: id.into() }
    }

    /// Conditional on the band count of `test`, decided at evaluation time
    pub fn if_has_bands(test: Image, then: Image, otherwise: Image) -> Self {
        Self::IfHasBands {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn select(self, bands: &[&str]) -> Self {
        Self::Select {
            input: Box::new(self),
            bands: bands.iter().map(|b| b.to_string()).collect(),
        }
    }

    pub fn rename(self, name: &str) -> Self {
        Self::Rename {
            input: Box::new(self),
            names: vec![name.to_string()],
        }
    }

    pub fn normalized_difference(self, a: &str, b: &str) -> Self {
        Self::NormalizedDifference {
            input: Box::new(self),
            bands: [a.to_string(), b.to_string()],
        }
    }

    fn binary(self, operator: BinaryOp, right: impl Into<Image>) -> Self {
        Self::Binary {
            operator,
            left: Box::new(self),
            right: Box::new(right.into()),
        }
    }

    pub fn add(self, right: impl Into<Image>) -> Self {
        self.binary(BinaryOp::Add, right)
    }

    pub fn subtract(self, right: impl Into<Image>) -> Self {
        self.binary(BinaryOp::Subtract, right)
    }

    pub fn multiply(self, right: impl Into<Image>) -> Self {
        self.binary(BinaryOp::Multiply, right)
    }

    pub fn divide(self, right: impl Into<Image>) -> Self {
        self.binary(BinaryOp::Divide, right)
    }

    pub fn cos(self) -> Self {
        Self::Unary {
            operator: UnaryOp::Cos,
            input: Box::new(self),
        }
    }

    pub fn unit_scale(self, low: f64, high: f64) -> Self {
        Self::UnitScale {
            input: Box::new(self),
            low,
            high,
        }
    }

    pub fn clamp(self, low: f64, high: f64) -> Self {
        Self::Clamp {
            input: Box::new(self),
            low,
            high,
        }
    }

    pub fn clip(self, geometry: Geometry) -> Self {
        Self::Clip {
            input: Box::new(self),
            geometry,
        }
    }

    pub fn terrain(self, product: TerrainProduct) -> Self {
        Self::Terrain {
            input: Box::new(self),
            product,
        }
    }

    /// Number of nodes in the expression tree
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Constant { .. } | Self::Asset { .. } | Self::Reduce { .. } => 0,
            Self::Select { input, .. }
            | Self::Rename { input, .. }
            | Self::NormalizedDifference { input, .. }
            | Self::Unary { input, .. }
            | Self::UnitScale { input, .. }
            | Self::Clamp { input, .. }
            | Self::Clip { input, .. }
            | Self::Terrain { input, .. } => input.node_count(),
            Self::Binary { left, right, .. } => left.node_count() + right.node_count(),
            Self::IfHasBands {
                test,
                then,
                otherwise,
            } => test.node_count() + then.node_count() + otherwise.node_count(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_nest_left_to_right() {
        let img = Image::constant(25.0).unit_scale(20.0, 45.0).clamp(0.0, 1.0);
        match img {
            Image::Clamp { input, low, high } => {
                assert_eq!((low, high), (0.0, 1.0));
                assert!(matches!(
                    *input,
                    Image::UnitScale { low, high, .. } if low == 20.0 && high == 45.0
                ));
            }
            other => panic!("unexpected root {other:?}"),
        }
    }

    #[test]
    fn json_is_tagged_by_op() {
        let img = Image::constant(25.0).rename("LST");
        let json = img.to_json().unwrap();
        assert_eq!(json["op"], "rename");
        assert_eq!(json["input"]["op"], "constant");
        assert_eq!(json["input"]["value"], 25.0);
        assert_eq!(json["names"][0], "LST");
    }

    #[test]
    fn collection_filters_serialise() {
        let window = TimeWindow::parse("2023-06-01", "2023-08-31").unwrap();
        let img = Collection::load("UCSB-CHG/CHIRPS/DAILY")
            .filter_date(window)
            .filter_lt("CLOUDY_PIXEL_PERCENTAGE", 10.0)
            .sum();
        let json = img.to_json().unwrap();
        assert_eq!(json["reducer"], "sum");
        assert_eq!(json["collection"]["filters"][0]["type"], "date");
        assert_eq!(json["collection"]["filters"][0]["window"]["start"], "2023-06-01");
        assert_eq!(json["collection"]["filters"][1]["type"], "property_less_than");

        let back: Image = serde_json::from_value(json).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn buffer_geometry_contains_center() {
        let region = Region::around(Coordinate::new(51.389, 35.6892));
        let geometry = Geometry::from(&region);
        assert!(geometry.contains(region.center()));
        assert_eq!(geometry.bounds(), region.bounds());
        assert_eq!(Image::constant(1.0).add(2.0).node_count(), 3);
    }
}
