pub mod file_system;
pub mod indexed_dir;
pub mod response;

pub use file_system::LocalFileSystem;
pub use indexed_dir::{AccessError, DirectoryAccessState, IndexedDir};
pub use response::HttpResponseWriter;
