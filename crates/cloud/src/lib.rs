//! # FireRisk Cloud
//!
//! Clients for the remote services the pipeline talks to:
//!
//! - [`ComputeClient`]: submits image exports and polls their operations
//! - [`DriveClient`]: finds folders, lists them and downloads files
//!
//! Both sit behind traits ([`ComputeBackend`], [`StorageBackend`]) so the
//! pipeline can run against in-memory fakes. Requests are signed through
//! [`CloudAuth`] and retried with exponential backoff on transient failures.

pub mod auth;
pub mod compute;
pub mod drive;
pub mod error;
pub mod http;
pub mod models;

pub use auth::{BearerToken, ClientSecrets, CloudAuth, InstalledFlow, NoAuth};
pub use compute::{ComputeBackend, ComputeClient, ComputeClientOptions};
pub use drive::{DriveClient, DriveClientOptions, StorageBackend};
pub use error::{CloudError, Result};
pub use http::{HttpClient, HttpOptions};
pub use models::{DriveFile, ExportRequest, Operation, OperationState};
