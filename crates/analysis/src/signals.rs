//! Environmental signals feeding the risk index.
//!
//! Each optical or climate signal is a filtered, reduced collection guarded
//! by a band-count conditional: when nothing matches the region and window,
//! the backend substitutes a constant raster instead of failing the export.

use std::fmt;

use firerisk_core::{Collection, Geometry, Image, Region, TerrainProduct, TimeWindow};

use crate::error::Result;

// ── Datasets ────────────────────────────────────────────────────────────

pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR";
pub const MODIS_LST: &str = "MODIS/006/MOD11A2";
pub const CHIRPS_DAILY: &str = "UCSB-CHG/CHIRPS/DAILY";
pub const SRTM_DEM: &str = "USGS/SRTMGL1_003";

pub const CLOUD_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
pub const MAX_CLOUD_PERCENT: f64 = 10.0;
pub const LST_BAND: &str = "LST_Day_1km";

/// MODIS LST digital numbers to kelvin
pub const LST_SCALE: f64 = 0.02;
pub const KELVIN_OFFSET: f64 = 273.15;

// ── Fallback defaults ───────────────────────────────────────────────────

pub const NDVI_FALLBACK: f64 = 0.0;
/// °C
pub const LST_FALLBACK: f64 = 25.0;
/// mm
pub const PRECIP_FALLBACK: f64 = 10.0;

// ── Time windows ────────────────────────────────────────────────────────

/// Vegetation and temperature window (end exclusive)
pub fn summer_window() -> Result<TimeWindow> {
    Ok(TimeWindow::parse("2023-07-01", "2023-08-31")?)
}

/// Precipitation window, starting a month earlier (end exclusive)
pub fn precipitation_window() -> Result<TimeWindow> {
    Ok(TimeWindow::parse("2023-06-01", "2023-08-31")?)
}

// ── Signal names ────────────────────────────────────────────────────────

/// Every raster a run exports, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Ndvi,
    Lst,
    Precip,
    Slope,
    AspectScore,
    FireRisk,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Signal::Ndvi,
        Signal::Lst,
        Signal::Precip,
        Signal::Slope,
        Signal::AspectScore,
        Signal::FireRisk,
    ];

    /// Band and export name
    pub fn name(self) -> &'static str {
        match self {
            Signal::Ndvi => "NDVI",
            Signal::Lst => "LST",
            Signal::Precip => "Precip",
            Signal::Slope => "Slope",
            Signal::AspectScore => "Aspect_Score",
            Signal::FireRisk => "Fire_Risk",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Fetchers ────────────────────────────────────────────────────────────

/// `reduced` when it has bands, otherwise a constant `fallback`, named `name`
fn with_fallback(reduced: Image, present: Image, fallback: f64, name: &str) -> Image {
    Image::if_has_bands(reduced, present.rename(name), Image::constant(fallback).rename(name))
}

/// Median NDVI of low-cloud Sentinel-2 scenes
pub fn ndvi(region: &Region, window: TimeWindow) -> Image {
    let median = Collection::load(SENTINEL2_SR)
        .filter_bounds(Geometry::from(region))
        .filter_date(window)
        .filter_lt(CLOUD_PROPERTY, MAX_CLOUD_PERCENT)
        .median();
    let nd = median.clone().normalized_difference("B8", "B4");
    with_fallback(median, nd, NDVI_FALLBACK, Signal::Ndvi.name())
}

/// Mean daytime land-surface temperature in °C
pub fn land_surface_temperature(region: &Region, window: TimeWindow) -> Image {
    let mean = Collection::load(MODIS_LST)
        .filter_bounds(Geometry::from(region))
        .filter_date(window)
        .select(&[LST_BAND])
        .mean();
    let celsius = mean.clone().multiply(LST_SCALE).subtract(KELVIN_OFFSET);
    with_fallback(mean, celsius, LST_FALLBACK, Signal::Lst.name())
}

/// Accumulated rainfall in mm
pub fn precipitation(region: &Region, window: TimeWindow) -> Image {
    let total = Collection::load(CHIRPS_DAILY)
        .filter_bounds(Geometry::from(region))
        .filter_date(window)
        .sum();
    with_fallback(total.clone(), total, PRECIP_FALLBACK, Signal::Precip.name())
}

/// Slope and aspect in degrees from the DEM clipped to the region.
/// No fallback: the DEM has global coverage.
pub fn terrain(region: &Region) -> (Image, Image) {
    let dem = Image::asset(SRTM_DEM).clip(Geometry::from(region));
    let slope = dem.clone().terrain(TerrainProduct::Slope).rename("Slope");
    let aspect = dem.terrain(TerrainProduct::Aspect).rename("Aspect");
    (slope, aspect)
}

/// Raw signal rasters for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    pub ndvi: Image,
    pub lst: Image,
    pub precip: Image,
    pub slope: Image,
    pub aspect: Image,
}

impl Signals {
    /// Assemble every signal over `region` with the fixed windows
    pub fn fetch(region: &Region) -> Result<Self> {
        let summer = summer_window()?;
        let (slope, aspect) = terrain(region);
        Ok(Self {
            ndvi: ndvi(region, summer),
            lst: land_surface_temperature(region, summer),
            precip: precipitation(region, precipitation_window()?),
            slope,
            aspect,
        })
    }
}
