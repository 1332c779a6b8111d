//! Directory resolution on top of a [`FileSystem`]: directories are answered
//! with their index document, a listing, or a forbidden error.

use std::io::ErrorKind;
use std::sync::{Mutex, PoisonError};

use crate::ports::file_system::{DirEntry, FileSystem, FileSystemError, FileSystemResult, FsEntry};

/// Classification of the last error an [`IndexedDir`] ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    NotFound,
    Forbidden,
    Other,
}

impl From<&FileSystemError> for AccessError {
    fn from(err: &FileSystemError) -> Self {
        match err {
            FileSystemError::Forbidden => AccessError::Forbidden,
            FileSystemError::InvalidPath(_) => AccessError::NotFound,
            FileSystemError::IoError(io) if io.kind() == ErrorKind::NotFound => {
                AccessError::NotFound
            }
            _ => AccessError::Other,
        }
    }
}

/// Per-request record of what went wrong while opening entries
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryAccessState {
    last_error: Option<AccessError>,
}

impl DirectoryAccessState {
    pub fn last_error(&self) -> Option<AccessError> {
        self.last_error
    }

    /// True when a directory was refused because listings are disabled
    pub fn is_forbidden(&self) -> bool {
        self.last_error == Some(AccessError::Forbidden)
    }
}

/// A file system adapter that resolves directories to a configured index
/// document, or refuses them when directory listing is disabled.
pub struct IndexedDir<'a, F> {
    fs: F,
    index: &'a [String],
    auto_index: bool,
    state: Mutex<DirectoryAccessState>,
}

impl<'a, F: FileSystem> IndexedDir<'a, F> {
    pub fn new(fs: F, index: &'a [String], auto_index: bool) -> Self {
        Self {
            fs,
            index,
            auto_index,
            state: Mutex::new(DirectoryAccessState::default()),
        }
    }

    /// Snapshot of the access state; read it after the serving call returns
    pub fn state(&self) -> DirectoryAccessState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, err: &FileSystemError) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_error = Some(AccessError::from(err));
    }
}

fn join_index(dir: &str, index: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{index}")
    } else {
        format!("{dir}/{index}")
    }
}

impl<F: FileSystem> FileSystem for IndexedDir<'_, F> {
    async fn open(&self, name: &str) -> FileSystemResult<FsEntry> {
        let entry = match self.fs.open(name).await {
            Ok(entry) => entry,
            Err(err) => {
                self.record(&err);
                return Err(err);
            }
        };

        if !entry.is_dir() {
            return Ok(entry);
        }

        for index in self.index {
            let candidate = join_index(name, index);
            match self.fs.open(&candidate).await {
                Ok(found) if !found.is_dir() => {
                    tracing::debug!("Resolved directory {} to index {}", name, candidate);
                    return Ok(found.into_directory_index());
                }
                _ => continue,
            }
        }

        if self.auto_index {
            return Ok(entry);
        }

        tracing::debug!("Directory {} has no index and autoindex is disabled", name);
        drop(entry);
        let err = FileSystemError::Forbidden;
        self.record(&err);
        Err(err)
    }

    async fn read_dir(&self, dir: &FsEntry) -> FileSystemResult<Vec<DirEntry>> {
        self.fs.read_dir(dir).await
    }
}
