//! Normaliser and compositor behaviour on evaluated rasters.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use firerisk_algorithms::eval::{CatalogImage, Evaluator, MemoryCatalog};
use firerisk_analysis::composite::fire_risk;
use firerisk_analysis::normalize::{
    aspect_south_score, normalize, Normalized, Range, LST_RANGE, NDVI_RANGE, PRECIP_RANGE,
    SLOPE_RANGE,
};
use firerisk_analysis::signals::SRTM_DEM;
use firerisk_analysis::RiskOutputs;
use firerisk_core::{Coordinate, GeoTransform, GridLayout, Image};

fn small_grid() -> GridLayout {
    GridLayout::new(GeoTransform::new(0.0, 3.0, 1.0, -1.0), 3, 3)
}

fn value_of(image: &Image) -> f64 {
    let catalog = MemoryCatalog::new();
    let data = Evaluator::new(&catalog, small_grid()).evaluate(image).unwrap();
    data.single().unwrap().get(1, 1).unwrap()
}

#[test]
fn normalized_values_stay_in_unit_interval() {
    for range in [NDVI_RANGE, LST_RANGE, SLOPE_RANGE, PRECIP_RANGE] {
        let Range { min, max } = range;
        assert_eq!(value_of(&normalize(Image::constant(max + 1000.0), range)), 1.0);
        assert_eq!(value_of(&normalize(Image::constant(min - 1000.0), range)), 0.0);
        assert_eq!(value_of(&normalize(Image::constant(min), range)), 0.0);
        assert_eq!(value_of(&normalize(Image::constant(max), range)), 1.0);

        for step in 0..=20 {
            let v = min - 10.0 + (max - min + 20.0) * step as f64 / 20.0;
            let n = value_of(&normalize(Image::constant(v), range));
            assert!((0.0..=1.0).contains(&n), "{v} normalised to {n}");
        }
    }
    assert_relative_eq!(value_of(&normalize(Image::constant(32.5), LST_RANGE)), 0.5);
}

#[test]
fn aspect_score_faces_south() {
    let score = |deg: f64| value_of(&aspect_south_score(Image::constant(deg)));
    assert_relative_eq!(score(180.0), 1.0, epsilon = 1e-12);
    assert_relative_eq!(score(0.0), -1.0, epsilon = 1e-12);
    assert_relative_eq!(score(360.0), -1.0, epsilon = 1e-12);
    assert_relative_eq!(score(90.0), 0.0, epsilon = 1e-12);
    assert_relative_eq!(score(270.0), 0.0, epsilon = 1e-12);
}

fn inputs(lst: f64, ndvi: f64, slope: f64, aspect_south: f64, precip: f64) -> Normalized {
    Normalized {
        ndvi: Image::constant(ndvi),
        lst: Image::constant(lst),
        slope: Image::constant(slope),
        precip: Image::constant(precip),
        aspect_south: Image::constant(aspect_south),
    }
}

#[test]
fn composite_weights() {
    assert_relative_eq!(value_of(&fire_risk(&inputs(1.0, 0.0, 0.0, 0.0, 0.0))), 0.30, epsilon = 1e-12);
    assert_relative_eq!(value_of(&fire_risk(&inputs(0.0, 1.0, 0.0, 0.0, 0.0))), -0.30, epsilon = 1e-12);
    assert_relative_eq!(value_of(&fire_risk(&inputs(0.0, 0.0, 1.0, 0.0, 0.0))), 0.15, epsilon = 1e-12);
    assert_relative_eq!(value_of(&fire_risk(&inputs(0.0, 0.0, 0.0, 1.0, 0.0))), 0.15, epsilon = 1e-12);
    assert_relative_eq!(value_of(&fire_risk(&inputs(0.0, 0.0, 0.0, 0.0, 1.0))), -0.10, epsilon = 1e-12);
}

#[test]
fn composite_is_not_clamped() {
    let worst = value_of(&fire_risk(&inputs(1.0, 0.0, 1.0, 1.0, 0.0)));
    let best = value_of(&fire_risk(&inputs(0.0, 1.0, 0.0, -1.0, 1.0)));
    assert_relative_eq!(worst, 0.60, epsilon = 1e-12);
    assert_relative_eq!(best, -0.55, epsilon = 1e-12);
}

#[test]
fn composite_is_deterministic() {
    let a = inputs(0.7, 0.2, 0.4, 0.1, 0.3);
    let catalog = MemoryCatalog::new();
    let eval = Evaluator::new(&catalog, small_grid());
    let first = eval.evaluate(&fire_risk(&a)).unwrap();
    let second = eval.evaluate(&fire_risk(&a)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.names(), ["Fire_Risk"]);
}

#[test]
fn full_analysis_with_fallbacks_on_a_south_slope() {
    let coord = Coordinate::new(51.389, 35.6892);
    let outputs = RiskOutputs::build(coord, 30_000.0).unwrap();
    let grid = GridLayout::covering(&outputs.region.bounds(), 0.005);

    // Plane dipping 10 degrees toward the south
    let rise_per_row = 0.005 * 111_320.0 * 10f64.to_radians().tan();
    let mut dem = grid.raster(0.0);
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            dem.set(row, col, 2000.0 + (grid.rows - row) as f64 * rise_per_row).unwrap();
        }
    }
    let mut catalog = MemoryCatalog::new();
    catalog.insert_asset(
        SRTM_DEM,
        CatalogImage::new(NaiveDate::from_ymd_opt(2000, 2, 11).unwrap(), outputs.region.bounds())
            .with_band("elevation", dem),
    );

    let (rows, cols) = grid.shape();
    let eval = Evaluator::new(&catalog, grid);
    let risk = eval.evaluate(&outputs.fire_risk).unwrap();
    let center = risk.band("Fire_Risk").unwrap().get(rows / 2, cols / 2).unwrap();

    let expected = 0.30 * (25.0 - 20.0) / 25.0 + 0.15 * 10.0 / 60.0 + 0.15 * 1.0 - 0.10 * 10.0 / 150.0;
    assert_relative_eq!(center, expected, epsilon = 1e-6);

    let aspect = eval.evaluate(&outputs.aspect_score).unwrap();
    assert_relative_eq!(aspect.single().unwrap().get(rows / 2, cols / 2).unwrap(), 1.0, epsilon = 1e-9);

    // Outside the buffer the clipped terrain is no-data
    assert!(risk.single().unwrap().get(0, 0).unwrap().is_nan());
}
