use http::StatusCode;

use crate::core::error_handler::ErrorHandler;
use crate::core::file_server::FileServer;

/// A construction-time setting for [`FileServer::with_options`]
#[derive(Debug, Clone)]
pub enum ServerOption {
    /// Allow directory listings for directories without an index document
    AutoIndex(bool),
    /// Replace the list of index document names
    Index(Vec<String>),
    /// Strip a prefix from every request path; requests outside it get a 404
    Prefix(String),
    /// Error page handler for one status code
    ErrorHandler(StatusCode, ErrorHandler),
    /// Error page handler for every status without a handler of its own
    DefaultErrorHandler(ErrorHandler),
}

impl ServerOption {
    pub(crate) fn apply(self, server: &mut FileServer) {
        match self {
            ServerOption::AutoIndex(enabled) => server.set_auto_index(enabled),
            ServerOption::Index(names) => server.set_index(names),
            ServerOption::Prefix(prefix) => server.set_prefix(prefix),
            ServerOption::ErrorHandler(status, handler) => {
                server.set_error_handler(status, handler)
            }
            ServerOption::DefaultErrorHandler(handler) => server.set_default_error_handler(handler),
        }
    }
}

pub fn with_auto_index(enabled: bool) -> ServerOption {
    ServerOption::AutoIndex(enabled)
}

pub fn with_index<I, S>(names: I) -> ServerOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ServerOption::Index(names.into_iter().map(Into::into).collect())
}

pub fn with_prefix(prefix: impl Into<String>) -> ServerOption {
    ServerOption::Prefix(prefix.into())
}

pub fn with_error_handler(status: StatusCode, handler: ErrorHandler) -> ServerOption {
    ServerOption::ErrorHandler(status, handler)
}

pub fn with_default_error_handler(handler: ErrorHandler) -> ServerOption {
    ServerOption::DefaultErrorHandler(handler)
}
