use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use http::{Request, StatusCode};

use crate::ports::response_writer::ResponseWriter;

/// Signature of a custom error page handler.
///
/// Handlers get the unwrapped writer and must write their own status and body.
pub type ErrorHandlerFn = dyn Fn(&mut dyn ResponseWriter, &Request<()>, StatusCode) + Send + Sync;

/// A shareable error page handler
#[derive(Clone)]
pub struct ErrorHandler(Arc<ErrorHandlerFn>);

impl ErrorHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut dyn ResponseWriter, &Request<()>, StatusCode) + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// A handler that answers with a fixed body and content type, keeping the
    /// status it was called for.
    pub fn static_page(content_type: HeaderValue, body: Bytes) -> Self {
        Self::new(move |w, _req, status| {
            let headers = w.headers_mut();
            headers.remove(CONTENT_LENGTH);
            headers.insert(CONTENT_TYPE, content_type.clone());
            w.write_status(status);
            if let Err(err) = w.write(body.clone()) {
                tracing::warn!("Error page for {} not written: {}", status, err);
            }
        })
    }

    pub fn call(&self, w: &mut dyn ResponseWriter, req: &Request<()>, status: StatusCode) {
        (self.0)(w, req, status)
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandler(..)")
    }
}

/// Error handlers keyed by exact status, with an optional default used for
/// every status that has no handler of its own.
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlers {
    by_status: HashMap<StatusCode, ErrorHandler>,
    default: Option<ErrorHandler>,
}

impl ErrorHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, status: StatusCode, handler: ErrorHandler) {
        self.by_status.insert(status, handler);
    }

    pub fn set_default(&mut self, handler: ErrorHandler) {
        self.default = Some(handler);
    }

    /// Exact match first, then the default handler
    pub fn lookup(&self, status: StatusCode) -> Option<&ErrorHandler> {
        self.by_status.get(&status).or(self.default.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.by_status.is_empty() && self.default.is_none()
    }
}

/// The message used for an error page nobody customised
pub fn default_error_message(status: StatusCode) -> String {
    match status {
        StatusCode::NOT_FOUND => "404 page not found".to_string(),
        _ => format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}

/// Plain-text error body: the message followed by a newline
pub fn error_body(message: &str) -> Bytes {
    Bytes::from(format!("{message}\n"))
}

/// Write `body` verbatim as a plain-text response with the given status
pub fn write_plain_text<W>(w: &mut W, status: StatusCode, body: Bytes)
where
    W: ResponseWriter + ?Sized,
{
    let headers = w.headers_mut();
    headers.remove(CONTENT_LENGTH);
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    w.write_status(status);
    if let Err(err) = w.write(body) {
        tracing::trace!("Error body for {} held back: {}", status, err);
    }
}

/// Write `message` as a plain-text error response
pub fn write_plain_error<W>(w: &mut W, status: StatusCode, message: &str)
where
    W: ResponseWriter + ?Sized,
{
    write_plain_text(w, status, error_body(message));
}
