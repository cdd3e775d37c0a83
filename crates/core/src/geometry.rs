//! Analysis coordinates, bounding boxes and buffered regions

use geo::{HaversineDestination, HaversineDistance, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Radius of the analysis buffer around the selected point, in meters
pub const DEFAULT_BUFFER_METERS: f64 = 30_000.0;

/// Vertices used when a region is rendered as a polygon
const REGION_SEGMENTS: usize = 64;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Self::new(p.x(), p.y())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lon {}, lat {})", self.lon, self.lat)
    }
}

/// Axis-aligned bounding box `[west, south, east, north]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.lon >= self.min_x && c.lon <= self.max_x && c.lat >= self.min_y && c.lat <= self.max_y
    }

    /// `[west, south, east, north]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Closed ring of the box corners, counter-clockwise from the south-west
    pub fn ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
            [self.min_x, self.min_y],
        ]
    }
}

/// The disk of `radius_m` meters around an analysis coordinate.
///
/// Every query and export of a run is restricted to one region. Distances
/// are great-circle (haversine) distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    center: Coordinate,
    radius_m: f64,
}

impl Region {
    /// Buffer `center` by `radius_m` meters
    pub fn buffer(center: Coordinate, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// The standard 30 km analysis region
    pub fn around(center: Coordinate) -> Self {
        Self::buffer(center, DEFAULT_BUFFER_METERS)
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Whether `c` lies within the buffer distance of the centre
    pub fn contains(&self, c: Coordinate) -> bool {
        self.center.to_point().haversine_distance(&c.to_point()) <= self.radius_m
    }

    /// Polygon approximation of the disk, one vertex every `360 / segments` degrees of bearing
    pub fn polygon(&self, segments: usize) -> Polygon<f64> {
        let n = segments.max(4);
        let origin = self.center.to_point();
        let mut coords: Vec<(f64, f64)> = (0..n)
            .map(|i| {
                let bearing = 360.0 * i as f64 / n as f64;
                let p = origin.haversine_destination(bearing, self.radius_m);
                (p.x(), p.y())
            })
            .collect();
        coords.push(coords[0]);
        Polygon::new(LineString::from(coords), vec![])
    }

    /// Bounding box of the disk, used as export footprint
    pub fn bounds(&self) -> BBox {
        let polygon = self.polygon(REGION_SEGMENTS);
        let mut bbox = BBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for c in polygon.exterior().coords() {
            bbox.min_x = bbox.min_x.min(c.x);
            bbox.min_y = bbox.min_y.min(c.y);
            bbox.max_x = bbox.max_x.max(c.x);
            bbox.max_y = bbox.max_y.max(c.y);
        }
        bbox
    }
}
