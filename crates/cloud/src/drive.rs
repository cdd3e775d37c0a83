//! Client for the remote storage backend (Drive v3 REST API).

use std::path::Path;

use tracing::{debug, info};

use crate::auth::CloudAuth;
use crate::error::Result;
use crate::http::{HttpClient, HttpOptions};
use crate::models::{About, DriveFile, FileList, FOLDER_MIME_TYPE};

/// Public REST endpoint of the storage backend
pub const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/drive/v3";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size)";
const PAGE_SIZE: &str = "1000";

/// Operations the pipeline needs from the storage backend.
#[allow(async_fn_in_trait)]
pub trait StorageBackend {
    /// Verify the credentials; returns the account they belong to
    async fn authenticate(&self) -> Result<String>;

    /// Every non-trashed folder called `name`
    async fn find_folders(&self, name: &str) -> Result<Vec<DriveFile>>;

    /// Every non-trashed child of a folder, across all pages
    async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>>;

    /// Download `file` to `dest`, overwriting; returns bytes written
    async fn download(&self, file: &DriveFile, dest: &Path) -> Result<u64>;
}

/// Configuration for [`DriveClient`].
#[derive(Debug, Clone)]
pub struct DriveClientOptions {
    /// API root (default [`DEFAULT_DRIVE_URL`]).
    pub base_url: String,
    pub http: HttpOptions,
}

impl Default for DriveClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DRIVE_URL.to_string(),
            http: HttpOptions::default(),
        }
    }
}

/// REST storage client.
pub struct DriveClient {
    http: HttpClient,
    auth: Box<dyn CloudAuth>,
    base_url: String,
}

impl DriveClient {
    pub fn new(auth: Box<dyn CloudAuth>, options: DriveClientOptions) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(options.http)?,
            auth,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run a files query, following `nextPageToken` until exhausted.
    async fn list_all(&self, query: &str) -> Result<Vec<DriveFile>> {
        let url = format!("{}/files", self.base_url);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("q", query),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: FileList = self.http.get_json(&url, &params, self.auth.as_ref()).await?;
            debug!(count = page.files.len(), "listed page");
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(files)
    }
}

impl StorageBackend for DriveClient {
    async fn authenticate(&self) -> Result<String> {
        let url = format!("{}/about", self.base_url);
        let about: About = self
            .http
            .get_json(&url, &[("fields", "user")], self.auth.as_ref())
            .await?;
        info!(account = %about.user.email_address, "authenticated to storage");
        Ok(about.user.email_address)
    }

    async fn find_folders(&self, name: &str) -> Result<Vec<DriveFile>> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            FOLDER_MIME_TYPE
        );
        self.list_all(&query).await
    }

    async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let query = format!("'{}' in parents and trashed = false", escape_query(folder_id));
        self.list_all(&query).await
    }

    async fn download(&self, file: &DriveFile, dest: &Path) -> Result<u64> {
        let url = format!("{}/files/{}", self.base_url, file.id);
        self.http
            .download(&url, &[("alt", "media")], self.auth.as_ref(), dest)
            .await
    }
}

/// Escape a literal for use inside a single-quoted query string
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_literals_are_escaped() {
        assert_eq!(escape_query("EarthEnginefatemeh"), "EarthEnginefatemeh");
        assert_eq!(escape_query("it's"), "it\\'s");
        assert_eq!(escape_query(r"a\b"), r"a\\b");
    }
}
