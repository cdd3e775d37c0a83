//! In-memory fakes of the compute and storage backends.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use firerisk_cloud::models::{OperationError, OperationMetadata, FOLDER_MIME_TYPE};
use firerisk_cloud::{
    CloudError, ComputeBackend, DriveFile, ExportRequest, Operation, OperationState,
    StorageBackend,
};

type Script = Box<dyn Fn(&str) -> Vec<OperationState>>;

/// Accepts every export and replays a scripted sequence of states per job.
/// The last state of a script repeats forever.
pub struct FakeCompute {
    pub submitted: RefCell<Vec<ExportRequest>>,
    pub polls: Cell<usize>,
    queues: RefCell<HashMap<String, VecDeque<OperationState>>>,
    script: Script,
}

impl FakeCompute {
    pub fn new(script: impl Fn(&str) -> Vec<OperationState> + 'static) -> Self {
        Self {
            submitted: RefCell::new(Vec::new()),
            polls: Cell::new(0),
            queues: RefCell::new(HashMap::new()),
            script: Box::new(script),
        }
    }

    /// Every job succeeds on its first poll
    pub fn succeeding() -> Self {
        Self::new(|_| vec![OperationState::Succeeded])
    }

    pub fn names(&self) -> Vec<String> {
        self.submitted
            .borrow()
            .iter()
            .map(|r| r.description.clone())
            .collect()
    }
}

fn operation(name: &str, state: OperationState) -> Operation {
    Operation {
        name: name.to_string(),
        done: state.is_terminal(),
        metadata: Some(OperationMetadata {
            state,
            ..Default::default()
        }),
        error: (state == OperationState::Failed).then(|| OperationError {
            code: 3,
            message: "Exported bands must have compatible data types".to_string(),
        }),
    }
}

impl ComputeBackend for FakeCompute {
    async fn start_export(&self, request: &ExportRequest) -> firerisk_cloud::Result<Operation> {
        let name = format!("projects/test/operations/{}", request.description);
        let states: VecDeque<_> = (self.script)(&request.description).into();
        self.queues.borrow_mut().insert(name.clone(), states);
        self.submitted.borrow_mut().push(request.clone());
        Ok(operation(&name, OperationState::Pending))
    }

    async fn operation(&self, name: &str) -> firerisk_cloud::Result<Operation> {
        self.polls.set(self.polls.get() + 1);
        let mut queues = self.queues.borrow_mut();
        let queue = queues
            .get_mut(name)
            .ok_or_else(|| CloudError::InvalidResponse(format!("unknown operation {name}")))?;
        let state = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().copied().unwrap_or_default()
        };
        Ok(operation(name, state))
    }
}

pub fn tiff(name: &str) -> DriveFile {
    DriveFile {
        id: format!("id-{name}"),
        name: name.to_string(),
        mime_type: "image/tiff".to_string(),
        size: None,
    }
}

pub fn folder(name: &str) -> DriveFile {
    DriveFile {
        id: format!("folder-{name}"),
        name: name.to_string(),
        mime_type: FOLDER_MIME_TYPE.to_string(),
        size: None,
    }
}

/// A storage account holding some folders, all sharing one child listing.
pub struct FakeStorage {
    pub folders: Vec<DriveFile>,
    pub children: Vec<DriveFile>,
    pub downloads: RefCell<Vec<String>>,
    pub authenticated: Cell<bool>,
    download_delay: Duration,
}

impl FakeStorage {
    pub fn new(folders: Vec<DriveFile>, children: Vec<DriveFile>) -> Self {
        Self {
            folders,
            children,
            downloads: RefCell::new(Vec::new()),
            authenticated: Cell::new(false),
            download_delay: Duration::ZERO,
        }
    }

    /// Each download takes `delay` of (virtual) time before it completes
    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }
}

impl StorageBackend for FakeStorage {
    async fn authenticate(&self) -> firerisk_cloud::Result<String> {
        self.authenticated.set(true);
        Ok("analyst@example.com".to_string())
    }

    async fn find_folders(&self, name: &str) -> firerisk_cloud::Result<Vec<DriveFile>> {
        assert!(self.authenticated.get(), "listed before authenticating");
        Ok(self.folders.iter().filter(|f| f.name == name).cloned().collect())
    }

    async fn list_children(&self, _folder_id: &str) -> firerisk_cloud::Result<Vec<DriveFile>> {
        Ok(self.children.clone())
    }

    async fn download(&self, file: &DriveFile, dest: &Path) -> firerisk_cloud::Result<u64> {
        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        }
        let body = format!("contents of {}", file.name);
        std::fs::write(dest, &body)?;
        self.downloads.borrow_mut().push(file.name.clone());
        Ok(body.len() as u64)
    }
}
