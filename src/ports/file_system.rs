use std::fs::Metadata;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Error type for file system operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FileSystemError {
    /// Error when encountering an IO issue
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error when path is invalid
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Directory has no index document and listings are disabled
    #[error("forbidden")]
    Forbidden,
}

/// Result type for file system operations
pub type FileSystemResult<T> = Result<T, FileSystemError>;

/// An opened file or directory.
///
/// Holds the stat result only. No OS handle is kept open, so dropping the
/// entry is all the closing it needs.
#[derive(Debug, Clone)]
pub struct FsEntry {
    path: PathBuf,
    is_dir: bool,
    len: u64,
    modified: Option<SystemTime>,
    directory_index: bool,
}

impl FsEntry {
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        Self {
            path,
            is_dir: metadata.is_dir(),
            len: metadata.len(),
            modified: metadata.modified().ok(),
            directory_index: false,
        }
    }

    /// Marks this entry as the index document of the directory that was requested
    pub fn into_directory_index(mut self) -> Self {
        self.directory_index = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// True when the entry was reached by resolving a directory to its index
    pub fn is_directory_index(&self) -> bool {
        self.directory_index
    }
}

/// A single child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// FileSystem defines the port (interface) for opening and listing files
pub trait FileSystem: Send + Sync {
    /// Open a file or directory
    ///
    /// # Arguments
    /// * `name` - Slash separated path, relative to the file system root
    ///
    /// # Returns
    /// A future that resolves to the opened entry or an error
    fn open(&self, name: &str) -> impl Future<Output = FileSystemResult<FsEntry>> + Send;

    /// List the children of a directory previously returned by `open`
    fn read_dir(
        &self,
        dir: &FsEntry,
    ) -> impl Future<Output = FileSystemResult<Vec<DirEntry>>> + Send;
}
