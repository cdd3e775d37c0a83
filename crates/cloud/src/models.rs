//! Wire types for the compute and storage REST APIs.
//!
//! Lightweight serde models covering the subset the pipeline needs: export
//! submission, long-running operation status, and folder listings.

use firerisk_core::{Geometry, Image};
use serde::{Deserialize, Serialize};

/// MIME type marking folders in the storage backend
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

// ---------------------------------------------------------------------------
// Export request
// ---------------------------------------------------------------------------

/// Body of `POST {base}/projects/{project}/image:export`.
///
/// ```json
/// {
///   "expression": { "op": "rename", "input": { ... }, "names": ["LST"] },
///   "description": "LST_35.6892_51.389",
///   "fileExportOptions": {
///     "fileFormat": "GEO_TIFF",
///     "driveDestination": { "folder": "EarthEnginefatemeh", "filenamePrefix": "LST_35.6892_51.389" }
///   },
///   "region": { "type": "rectangle", "bbox": [51.05, 35.42, 51.72, 35.96] },
///   "scale": 30.0,
///   "maxPixels": 10000000000000
/// }
/// ```
///
/// `expression` is the serialised [`Image`] graph, tagged by `op`. The
/// service answers with an [`Operation`] whose `name` is then polled with
/// `GET {base}/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub expression: Image,
    pub description: String,
    pub file_export_options: FileExportOptions,
    /// Export footprint
    pub region: Geometry,
    /// Pixel size in meters
    pub scale: f64,
    pub max_pixels: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExportOptions {
    pub file_format: String,
    pub drive_destination: DriveDestination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDestination {
    pub folder: String,
    pub filename_prefix: String,
}

impl ExportRequest {
    /// GeoTIFF export of `expression` into a storage folder.
    ///
    /// The task description and the filename prefix are both `name`.
    pub fn to_drive(
        expression: Image,
        name: &str,
        folder: &str,
        region: Geometry,
        scale: f64,
        max_pixels: u64,
    ) -> Self {
        Self {
            expression,
            description: name.to_string(),
            file_export_options: FileExportOptions {
                file_format: "GEO_TIFF".to_string(),
                drive_destination: DriveDestination {
                    folder: folder.to_string(),
                    filename_prefix: name.to_string(),
                },
            },
            region,
            scale,
            max_pixels,
        }
    }

    pub fn filename_prefix(&self) -> &str {
        &self.file_export_options.drive_destination.filename_prefix
    }

    pub fn folder(&self) -> &str {
        &self.file_export_options.drive_destination.folder
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Lifecycle state of an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Pending,
    Running,
    Cancelling,
    Succeeded,
    Failed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMetadata {
    #[serde(default)]
    pub state: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A long-running backend operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Resource name, e.g. `projects/p/operations/ABC`
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OperationMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl Operation {
    /// Effective state: an error means failure, and a finished operation
    /// without a terminal metadata state counts as succeeded.
    pub fn state(&self) -> OperationState {
        if self.error.is_some() {
            return OperationState::Failed;
        }
        let state = self.metadata.as_ref().map(|m| m.state).unwrap_or_default();
        if self.done && !state.is_terminal() {
            OperationState::Succeeded
        } else {
            state
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        match (&self.error, self.state()) {
            (Some(err), _) => Some(err.message.clone()),
            (None, OperationState::Failed) => Some("export failed".to_string()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Storage listings
// ---------------------------------------------------------------------------

/// A file or folder in the storage backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Byte size as a decimal string, absent for folders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.parse().ok())
    }
}

/// One page of `GET /files`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub user: AboutUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutUser {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email_address: String,
}
