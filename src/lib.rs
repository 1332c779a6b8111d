/// dirserve - Static file serving with error pages, listing control and prefix stripping
///
/// This crate wraps a plain directory-serving handler with:
/// - Index documents, or a 403 for directories without one
/// - Optional directory listings
/// - Prefix stripping with a 404 for requests outside the prefix
/// - Per-status error page handlers with a default fallback
// Re-export public modules with explicit visibility controls
pub mod adapters;
pub mod config;
pub mod core;
pub mod ports;
pub mod tracing_setup;

// Re-export the specific types needed by the binary crate and embedders
pub use crate::adapters::{HttpResponseWriter, IndexedDir, LocalFileSystem};
pub use crate::core::{
    ErrorHandler, FileServer, ServerOption, with_auto_index, with_default_error_handler,
    with_error_handler, with_index, with_prefix,
};
pub use crate::ports::{FileSystem, ResponseWriter, WriteError};
