pub mod file_system;
pub mod response_writer;

pub use file_system::{DirEntry, FileSystem, FileSystemError, FileSystemResult, FsEntry};
pub use response_writer::{ResponseWriter, WriteError, WriteResult};
