use std::path::{MAIN_SEPARATOR, PathBuf};
use tokio::fs;

use crate::ports::file_system::{
    DirEntry, FileSystem, FileSystemError, FileSystemResult, FsEntry,
};

/// A file system implementation rooted at a local directory, backed by `tokio::fs`
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
}

impl LocalFileSystem {
    /// Creates a new LocalFileSystem serving everything below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Map a slash separated request name onto a path below the root.
    ///
    /// `.` and `..` segments are resolved lexically and can never climb above
    /// the root, so `/../etc/passwd` resolves to `<root>/etc/passwd`.
    pub fn resolve(&self, name: &str) -> FileSystemResult<PathBuf> {
        if name.contains('\0') {
            return Err(FileSystemError::InvalidPath(name.to_string()));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in name.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => {
                    if MAIN_SEPARATOR != '/' && other.contains(MAIN_SEPARATOR) {
                        return Err(FileSystemError::InvalidPath(name.to_string()));
                    }
                    segments.push(other);
                }
            }
        }

        let mut path = self.root.clone();
        path.extend(segments);
        Ok(path)
    }
}

impl FileSystem for LocalFileSystem {
    async fn open(&self, name: &str) -> FileSystemResult<FsEntry> {
        let path = self.resolve(name)?;
        let metadata = fs::metadata(&path).await?;
        Ok(FsEntry::from_metadata(path, &metadata))
    }

    async fn read_dir(&self, dir: &FsEntry) -> FileSystemResult<Vec<DirEntry>> {
        let mut reader = fs::read_dir(dir.path()).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let is_dir = entry.file_type().await?.is_dir();
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
