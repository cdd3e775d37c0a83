//! Client for the remote computation backend.
//!
//! Exports are submitted as long-running operations; their progress is read
//! back by operation name. The service speaks the JSON contract documented
//! on [`ExportRequest`] and [`Operation`]: the client evaluates nothing
//! itself and sends the expression graph as-is, so it needs a service that
//! understands that graph. There is no default endpoint.

use reqwest::Url;
use tracing::{debug, info};

use crate::auth::CloudAuth;
use crate::error::{CloudError, Result};
use crate::http::{HttpClient, HttpOptions};
use crate::models::{ExportRequest, Operation};

/// Operations the pipeline needs from the compute backend.
#[allow(async_fn_in_trait)]
pub trait ComputeBackend {
    /// Submit an export; returns once the backend has accepted the job
    async fn start_export(&self, request: &ExportRequest) -> Result<Operation>;

    /// Current status of a submitted operation
    async fn operation(&self, name: &str) -> Result<Operation>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`ComputeClient`].
#[derive(Debug, Clone, Default)]
pub struct ComputeClientOptions {
    pub http: HttpOptions,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// REST client bound to one cloud project.
pub struct ComputeClient {
    http: HttpClient,
    auth: Box<dyn CloudAuth>,
    base_url: String,
    project: String,
}

impl ComputeClient {
    /// Initialise a client for `project` on the service rooted at `base_url`.
    pub fn new(
        base_url: &str,
        project: &str,
        auth: Box<dyn CloudAuth>,
        options: ComputeClientOptions,
    ) -> Result<Self> {
        if project.trim().is_empty() {
            return Err(CloudError::Config("compute project id is empty".into()));
        }
        let url = Url::parse(base_url)
            .map_err(|e| CloudError::Config(format!("invalid compute URL '{base_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CloudError::Config(format!("compute URL must be http(s): {base_url}")));
        }
        info!(project, base_url, "initialised compute backend");
        Ok(Self {
            http: HttpClient::new(options.http)?,
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn export_url(&self) -> String {
        format!("{}/projects/{}/image:export", self.base_url, self.project)
    }
}

impl ComputeBackend for ComputeClient {
    async fn start_export(&self, request: &ExportRequest) -> Result<Operation> {
        let url = self.export_url();
        debug!(url, description = %request.description, "submitting export");
        let op: Operation = self.http.post_json(&url, request, self.auth.as_ref()).await?;
        if op.name.is_empty() {
            return Err(CloudError::InvalidResponse("export accepted without an operation name".into()));
        }
        Ok(op)
    }

    async fn operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/{}", self.base_url, name.trim_start_matches('/'));
        self.http.get_json(&url, &[], self.auth.as_ref()).await
    }
}
