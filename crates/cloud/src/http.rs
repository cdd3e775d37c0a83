//! HTTP client wrapper with authentication and retry logic.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::auth::CloudAuth;
use crate::error::{CloudError, Result};

/// Configuration for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout (default 60 s).
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each attempt (default 500 ms).
    pub initial_backoff: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Authenticated JSON and download client shared by the API clients.
pub struct HttpClient {
    client: Client,
    options: HttpOptions,
}

impl HttpClient {
    pub fn new(options: HttpOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }

    /// GET `url` with query parameters and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        auth: &dyn CloudAuth,
    ) -> Result<T> {
        let req = self.sign(self.client.get(url).query(query), url, "GET", auth)?;
        let resp = self.execute_with_retry(req, url).await?;
        decode(resp).await
    }

    /// POST a JSON body to `url` and decode the JSON response
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        auth: &dyn CloudAuth,
    ) -> Result<T> {
        let req = self.sign(self.client.post(url).json(body), url, "POST", auth)?;
        let resp = self.execute_with_retry(req, url).await?;
        decode(resp).await
    }

    /// Stream the body of a GET request into `dest`, replacing any existing
    /// file. Returns the number of bytes written.
    pub async fn download(
        &self,
        url: &str,
        query: &[(&str, &str)],
        auth: &dyn CloudAuth,
        dest: &Path,
    ) -> Result<u64> {
        let req = self.sign(self.client.get(url).query(query), url, "GET", auth)?;
        let resp = self.execute_with_retry(req, url).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        debug!(path = %dest.display(), bytes = written, "download complete");
        Ok(written)
    }

    fn sign(
        &self,
        mut req: RequestBuilder,
        url: &str,
        method: &str,
        auth: &dyn CloudAuth,
    ) -> Result<RequestBuilder> {
        let mut auth_headers = Vec::new();
        auth.sign_request(url, method, &mut auth_headers)?;
        for (key, value) in &auth_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        Ok(req)
    }

    /// Send with exponential backoff on connect/timeout errors, 429 and 5xx.
    /// Other 4xx responses fail immediately.
    async fn execute_with_retry(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let mut last_err = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = self.options.initial_backoff * 2u32.pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }

            let Some(cloned) = request.try_clone() else {
                return check_status(request.send().await?, url).await;
            };

            let err = match cloned.send().await {
                Ok(resp) => match check_status(resp, url).await {
                    Ok(resp) => return Ok(resp),
                    Err(e) => e,
                },
                Err(e) => CloudError::Http(e),
            };

            if !err.is_transient() {
                return Err(err);
            }
            warn!(attempt = attempt + 1, url, "transient failure: {err}");
            last_err = Some(err);
        }

        Err(last_err.unwrap_or_else(|| CloudError::Network(format!("request to {url} failed"))))
    }
}

async fn check_status(resp: Response, url: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CloudError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body: body.chars().take(500).collect(),
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| CloudError::InvalidResponse(format!("{e}: {}", body.chars().take(200).collect::<String>())))
}
