//! End-to-end run: region, signals, risk index, exports, wait, retrieval.

use std::future::Future;

use firerisk_cloud::{ComputeBackend, ExportRequest, StorageBackend};
use firerisk_core::{Coordinate, Image, Region};
use tracing::{info, warn};

use crate::composite::fire_risk;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::export::{build_requests, dispatch, SubmittedExport};
use crate::normalize::Normalized;
use crate::retrieve::{retrieve, RetrievalReport, RetrievalScope};
use crate::signals::{Signal, Signals};
use crate::wait::{wait_for_exports, WaitReport};

/// The six exported rasters of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOutputs {
    pub region: Region,
    pub signals: Signals,
    pub aspect_score: Image,
    pub fire_risk: Image,
}

impl RiskOutputs {
    /// Build every raster for the region around `coord`
    pub fn build(coord: Coordinate, buffer_m: f64) -> Result<Self> {
        let region = Region::buffer(coord, buffer_m);
        let signals = Signals::fetch(&region)?;
        let normalized = Normalized::from_signals(&signals);
        Ok(Self {
            region,
            fire_risk: fire_risk(&normalized),
            aspect_score: normalized.aspect_south,
            signals,
        })
    }

    /// Rasters paired with their signal, in export order
    pub fn layers(&self) -> Vec<(Signal, Image)> {
        vec![
            (Signal::Ndvi, self.signals.ndvi.clone()),
            (Signal::Lst, self.signals.lst.clone()),
            (Signal::Precip, self.signals.precip.clone()),
            (Signal::Slope, self.signals.slope.clone()),
            (Signal::AspectScore, self.aspect_score.clone()),
            (Signal::FireRisk, self.fire_risk.clone()),
        ]
    }
}

/// The export requests a run at `coord` would submit
pub fn plan_exports(coord: Coordinate, config: &AnalysisConfig) -> Result<Vec<ExportRequest>> {
    let outputs = RiskOutputs::build(coord, config.buffer_m)?;
    Ok(build_requests(&outputs.layers(), coord, &outputs.region, config))
}

/// Build the analysis and start its exports
pub async fn run_analysis<C: ComputeBackend>(
    compute: &C,
    coord: Coordinate,
    config: &AnalysisConfig,
) -> Result<Vec<SubmittedExport>> {
    info!("Running fire risk analysis at {coord}");
    let requests = plan_exports(coord, config)?;
    let submitted = dispatch(compute, &requests).await?;
    info!("All {} export tasks started", submitted.len());
    Ok(submitted)
}

/// Everything a full run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub exports: Vec<SubmittedExport>,
    pub wait: WaitReport,
    /// `None` when there was nothing to fetch or retrieval was interrupted
    pub retrieval: Option<RetrievalReport>,
    /// Retrieval was cut short by the cancellation signal
    pub retrieval_interrupted: bool,
}

/// Analysis, wait and retrieval in sequence.
///
/// `cancel` produces a fresh cancellation future for each stage. The first
/// one interrupts the wait; the exports already known to have succeeded are
/// then still retrieved, and a second cancellation stops that retrieval.
pub async fn run<C, S, K, F>(
    compute: &C,
    storage: &S,
    coord: Coordinate,
    config: &AnalysisConfig,
    cancel: K,
) -> Result<RunReport>
where
    C: ComputeBackend,
    S: StorageBackend,
    K: Fn() -> F,
    F: Future<Output = ()>,
{
    let exports = run_analysis(compute, coord, config).await?;
    let wait = wait_for_exports(compute, &exports, &config.wait, cancel()).await?;

    let prefixes = wait.retrievable();
    let mut retrieval = None;
    let mut retrieval_interrupted = false;
    if config.scope == RetrievalScope::RunOnly && prefixes.is_empty() {
        info!("No completed exports to retrieve");
    } else {
        tokio::select! {
            res = retrieve(storage, &config.folder, &config.download_dir, &prefixes, config.scope) => {
                retrieval = Some(res?);
            }
            _ = cancel() => {
                warn!("retrieval interrupted");
                retrieval_interrupted = true;
            }
        }
    }

    Ok(RunReport {
        exports,
        wait,
        retrieval,
        retrieval_interrupted,
    })
}
