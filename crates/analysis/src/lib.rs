//! # FireRisk Analysis
//!
//! The wildfire-risk pipeline:
//!
//! 1. buffer the analysis point into a [`Region`](firerisk_core::Region)
//! 2. fetch NDVI, land-surface temperature, precipitation and terrain,
//!    with constant fallbacks for empty collections ([`signals`])
//! 3. normalise them onto [0, 1] ([`normalize`])
//! 4. combine them into the risk index ([`composite`])
//! 5. export six rasters through the compute backend ([`export`])
//! 6. wait for the exports ([`wait`]) and download them ([`retrieve`])
//!
//! Everything is generic over [`ComputeBackend`](firerisk_cloud::ComputeBackend)
//! and [`StorageBackend`](firerisk_cloud::StorageBackend).

pub mod composite;
pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod pipeline;
pub mod provinces;
pub mod retrieve;
pub mod signals;
pub mod wait;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use export::{export_name, format_coordinate, SubmittedExport};
pub use pipeline::{plan_exports, run, run_analysis, RiskOutputs, RunReport};
pub use provinces::{find_province, nearest_province, Province, IRAN_MAP, PROVINCES};
pub use retrieve::{retrieve, RetrievalReport, RetrievalScope};
pub use signals::{Signal, Signals};
pub use wait::{wait_for_exports, ExportOutcome, PollPolicy, WaitPolicy, WaitReport};
