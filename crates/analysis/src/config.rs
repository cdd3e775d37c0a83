//! Run configuration with the built-in defaults.

use std::path::PathBuf;

use firerisk_core::DEFAULT_BUFFER_METERS;

use crate::retrieve::RetrievalScope;
use crate::wait::WaitPolicy;

/// Cloud project the compute backend bills to
pub const DEFAULT_PROJECT: &str = "project-ee-458713";
/// Storage folder receiving every export
pub const DEFAULT_FOLDER: &str = "EarthEnginefatemeh";
/// Local directory downloads are written to
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
/// Export pixel size in meters
pub const EXPORT_SCALE: f64 = 30.0;
/// Upper bound on pixels per export (1e13)
pub const EXPORT_MAX_PIXELS: u64 = 10_000_000_000_000;

/// Everything a run needs besides the coordinate and the backends.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub project: String,
    pub folder: String,
    pub download_dir: PathBuf,
    pub buffer_m: f64,
    pub scale: f64,
    pub max_pixels: u64,
    pub wait: WaitPolicy,
    pub scope: RetrievalScope,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            buffer_m: DEFAULT_BUFFER_METERS,
            scale: EXPORT_SCALE,
            max_pixels: EXPORT_MAX_PIXELS,
            wait: WaitPolicy::default(),
            scope: RetrievalScope::RunOnly,
        }
    }
}
