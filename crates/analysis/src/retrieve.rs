//! Downloading exported files from the storage folder.

use std::path::{Path, PathBuf};

use firerisk_cloud::{DriveFile, StorageBackend};
use tracing::{info, warn};

use crate::error::{AnalysisError, Result};

/// Which files of the folder to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalScope {
    /// Only the files exported by this run
    RunOnly,
    /// Everything in the folder
    AllFiles,
}

/// Whether `name` is one of the files produced for export `prefix`: the
/// prefix itself, or the prefix followed by `.` (extension) or `-` (shard
/// suffix).
pub fn belongs_to(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('-'),
        None => false,
    }
}

/// A name that can be written into the download directory as-is
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Partition of a folder listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub selected: Vec<DriveFile>,
    /// Folders and unsafe names, never downloaded
    pub skipped: Vec<DriveFile>,
    /// Expected prefixes without any matching file
    pub missing: Vec<String>,
}

/// Choose the files to download from a folder listing.
///
/// With [`RetrievalScope::RunOnly`] only files belonging to one of
/// `prefixes` are selected; files of other runs are ignored silently.
pub fn select_files(files: Vec<DriveFile>, prefixes: &[String], scope: RetrievalScope) -> Selection {
    let mut selection = Selection::default();

    for file in files {
        let wanted = match scope {
            RetrievalScope::AllFiles => true,
            RetrievalScope::RunOnly => prefixes.iter().any(|p| belongs_to(&file.name, p)),
        };
        if !wanted {
            continue;
        }
        if file.is_folder() || !is_plain_file_name(&file.name) {
            warn!("Skipping {} ({})", file.name, file.mime_type);
            selection.skipped.push(file);
        } else {
            selection.selected.push(file);
        }
    }

    if scope == RetrievalScope::RunOnly {
        selection.missing = prefixes
            .iter()
            .filter(|p| !selection.selected.iter().any(|f| belongs_to(&f.name, p)))
            .cloned()
            .collect();
    }
    selection
}

/// What a retrieval wrote and what it could not find.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalReport {
    pub account: String,
    pub downloaded: Vec<PathBuf>,
    pub bytes: u64,
    pub skipped: Vec<String>,
    pub missing: Vec<String>,
}

/// Authenticate, locate `folder`, list it and download the selected files
/// into `download_dir` under their original names.
///
/// Fails when no folder of that name exists. Nothing is deleted remotely.
pub async fn retrieve<S: StorageBackend>(
    storage: &S,
    folder: &str,
    download_dir: &Path,
    prefixes: &[String],
    scope: RetrievalScope,
) -> Result<RetrievalReport> {
    let account = storage.authenticate().await?;

    let folders = storage.find_folders(folder).await?;
    let Some(target) = folders.first() else {
        return Err(AnalysisError::FolderNotFound(folder.to_string()));
    };
    if folders.len() > 1 {
        warn!(count = folders.len(), "several folders named '{folder}', using the first");
    }

    let files = storage.list_children(&target.id).await?;
    let selection = select_files(files, prefixes, scope);

    tokio::fs::create_dir_all(download_dir).await?;

    let mut report = RetrievalReport {
        account,
        ..Default::default()
    };
    for file in &selection.selected {
        info!("Downloading {}...", file.name);
        let dest = download_dir.join(&file.name);
        report.bytes += storage.download(file, &dest).await?;
        report.downloaded.push(dest);
    }

    for prefix in &selection.missing {
        warn!("No file found for export {prefix}");
    }
    report.skipped = selection.skipped.into_iter().map(|f| f.name).collect();
    report.missing = selection.missing;
    info!(files = report.downloaded.len(), "retrieval complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> DriveFile {
        DriveFile {
            id: name.to_string(),
            name: name.to_string(),
            mime_type: "image/tiff".to_string(),
            size: None,
        }
    }

    #[test]
    fn prefix_matching() {
        assert!(belongs_to("NDVI_35.0_51.0.tif", "NDVI_35.0_51.0"));
        assert!(belongs_to("NDVI_35.0_51.0-0000000000-0000000000.tif", "NDVI_35.0_51.0"));
        assert!(belongs_to("NDVI_35.0_51.0", "NDVI_35.0_51.0"));
        assert!(!belongs_to("NDVI_35.0_51.05.tif", "NDVI_35.0_51.0"));
        assert!(!belongs_to("LST_35.0_51.0.tif", "NDVI_35.0_51.0"));
    }

    #[test]
    fn plain_names() {
        assert!(is_plain_file_name("Fire_Risk_35.0_51.0.tif"));
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn selection_reports_missing_and_skipped() {
        let mut folder = file("Slope_1.0_2.0");
        folder.mime_type = firerisk_cloud::models::FOLDER_MIME_TYPE.to_string();
        let files = vec![file("NDVI_1.0_2.0.tif"), file("NDVI_9.0_9.0.tif"), folder];
        let prefixes = vec!["NDVI_1.0_2.0".to_string(), "Slope_1.0_2.0".to_string()];

        let selection = select_files(files.clone(), &prefixes, RetrievalScope::RunOnly);
        assert_eq!(selection.selected, vec![file("NDVI_1.0_2.0.tif")]);
        assert_eq!(selection.skipped.len(), 1);
        assert_eq!(selection.missing, vec!["Slope_1.0_2.0".to_string()]);

        let all = select_files(files, &prefixes, RetrievalScope::AllFiles);
        assert_eq!(all.selected.len(), 2);
        assert!(all.missing.is_empty());
    }
}
