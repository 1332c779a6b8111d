pub mod error_handler;
pub mod file_server;
pub mod interceptor;
pub mod listing;
pub mod options;
pub mod static_files;

pub use error_handler::{ErrorHandler, ErrorHandlers};
pub use file_server::FileServer;
pub use interceptor::ResponseInterceptor;
pub use options::{
    ServerOption, with_auto_index, with_default_error_handler, with_error_handler, with_index,
    with_prefix,
};
