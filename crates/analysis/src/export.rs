//! Export job construction and submission.

use firerisk_cloud::{ComputeBackend, ExportRequest};
use firerisk_core::{Coordinate, Geometry, Image, Region};
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::signals::Signal;

/// Format a coordinate the way the export names expect: the shortest
/// decimal that round-trips, with `.0` kept on integral values.
///
/// ```text
/// 35.6892 -> "35.6892"   51.0 -> "51.0"   -0.0 -> "-0.0"   1e-5 -> "1e-05"
/// ```
pub fn format_coordinate(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        // Exponent form with at least two exponent digits
        let sci = format!("{value:e}");
        if let Some((mantissa, exp)) = sci.split_once('e') {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            return format!("{mantissa}e{sign}{digits:0>2}");
        }
        return sci;
    }
    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

/// `{Signal}_{lat}_{lon}` from the literal input values
pub fn export_name(signal: Signal, coord: Coordinate) -> String {
    format!(
        "{}_{}_{}",
        signal.name(),
        format_coordinate(coord.lat),
        format_coordinate(coord.lon)
    )
}

/// One export request per output raster, in [`Signal::ALL`] order.
pub fn build_requests(
    outputs: &[(Signal, Image)],
    coord: Coordinate,
    region: &Region,
    config: &AnalysisConfig,
) -> Vec<ExportRequest> {
    let footprint = Geometry::rectangle(&region.bounds());
    outputs
        .iter()
        .map(|(signal, image)| {
            ExportRequest::to_drive(
                image.clone(),
                &export_name(*signal, coord),
                &config.folder,
                footprint.clone(),
                config.scale,
                config.max_pixels,
            )
        })
        .collect()
}

/// A job the backend has accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedExport {
    /// Filename prefix, also the task description
    pub name: String,
    /// Backend operation to poll
    pub operation: String,
}

/// Start every export; returns as soon as each is accepted.
pub async fn dispatch<C: ComputeBackend>(
    backend: &C,
    requests: &[ExportRequest],
) -> Result<Vec<SubmittedExport>> {
    let mut submitted = Vec::with_capacity(requests.len());
    for request in requests {
        let op = backend.start_export(request).await?;
        info!("Export started: {}", request.description);
        submitted.push(SubmittedExport {
            name: request.filename_prefix().to_string(),
            operation: op.name,
        });
    }
    Ok(submitted)
}
