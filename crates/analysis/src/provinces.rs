//! Province centroids and the map canvas used to pick them.

use firerisk_core::Coordinate;

use crate::error::{AnalysisError, Result};

/// A named province centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Province {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

impl Province {
    const fn new(name: &'static str, lat: f64, lon: f64) -> Self {
        Self { name, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lon, self.lat)
    }
}

pub static PROVINCES: [Province; 30] = [
    Province::new("Tehran", 35.6892, 51.3890),
    Province::new("Isfahan", 32.6519, 51.6680),
    Province::new("Fars", 29.5893, 52.5311),
    Province::new("Razavi Khorasan", 36.3000, 59.6000),
    Province::new("Mazandaran", 36.5525, 53.0762),
    Province::new("Kurdistan", 34.7800, 46.5300),
    Province::new("Khuzestan", 31.9391, 48.6692),
    Province::new("East Azerbaijan", 38.0700, 46.2960),
    Province::new("West Azerbaijan", 37.5300, 45.0000),
    Province::new("Ardabil", 38.2500, 48.3000),
    Province::new("Zanjan", 36.6764, 48.4963),
    Province::new("Qazvin", 36.2700, 50.0000),
    Province::new("Gilan", 37.2800, 49.5832),
    Province::new("Golestan", 36.8400, 54.4300),
    Province::new("Semnan", 35.5700, 53.4000),
    Province::new("Alborz", 35.8400, 50.9400),
    Province::new("Qom", 34.6400, 50.8800),
    Province::new("Markazi", 34.1000, 49.7000),
    Province::new("Hamedan", 34.8000, 48.5000),
    Province::new("Ilam", 33.6300, 46.4200),
    Province::new("Lorestan", 33.5800, 48.3500),
    Province::new("Chaharmahal and Bakhtiari", 32.3200, 50.8600),
    Province::new("Kohgiluyeh and Boyer-Ahmad", 30.6500, 51.6000),
    Province::new("Bushehr", 28.9200, 50.8300),
    Province::new("Hormozgan", 27.2000, 56.3700),
    Province::new("Sistan and Baluchestan", 29.4900, 60.8500),
    Province::new("Kerman", 30.2839, 57.0834),
    Province::new("Yazd", 31.8974, 54.3569),
    Province::new("South Khorasan", 32.8700, 59.2200),
    Province::new("North Khorasan", 37.4700, 57.3300),
];

// ── Map canvas ──────────────────────────────────────────────────────────

/// Geographic extent and pixel size of the selection map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCanvas {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub width: u32,
    pub height: u32,
}

/// The 800x1000 map of Iran
pub const IRAN_MAP: MapCanvas = MapCanvas {
    min_lat: 25.0,
    max_lat: 39.0,
    min_lon: 44.0,
    max_lon: 63.0,
    width: 800,
    height: 1000,
};

impl MapCanvas {
    /// Pixel (x, y) of a position; y grows southward. Truncates toward zero.
    pub fn geo_to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let x = (lon - self.min_lon) / (self.max_lon - self.min_lon) * self.width as f64;
        let y = (self.max_lat - lat) / (self.max_lat - self.min_lat) * self.height as f64;
        (x as i64, y as i64)
    }

    /// `(lat, lon)` under pixel (x, y)
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = x / self.width as f64 * (self.max_lon - self.min_lon) + self.min_lon;
        let lat = self.max_lat - y / self.height as f64 * (self.max_lat - self.min_lat);
        (lat, lon)
    }

    /// Province nearest to the clicked pixel
    pub fn click(&self, x: f64, y: f64) -> &'static Province {
        let (lat, lon) = self.pixel_to_geo(x, y);
        nearest_province(lat, lon)
    }
}

/// Province whose centroid is closest in plain degree space.
/// Ties go to the earlier table entry.
pub fn nearest_province(lat: f64, lon: f64) -> &'static Province {
    let mut best = &PROVINCES[0];
    let mut best_dist = f64::INFINITY;
    for p in PROVINCES.iter() {
        let dist = (lat - p.lat).hypot(lon - p.lon);
        if dist < best_dist {
            best = p;
            best_dist = dist;
        }
    }
    best
}

/// Look up a province by name (case-insensitive) or 1-based table number.
pub fn find_province(query: &str) -> Result<&'static Province> {
    let query = query.trim();
    if let Ok(n) = query.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| PROVINCES.get(i))
            .ok_or_else(|| {
                AnalysisError::InvalidSelection(format!("no province number {n} (1-{})", PROVINCES.len()))
            });
    }
    PROVINCES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(query))
        .ok_or_else(|| AnalysisError::InvalidSelection(format!("unknown province '{query}'")))
}
