use axum::body::Body as AxumBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use thiserror::Error;

/// Error returned by a writer that refused to send content
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WriteError {
    /// The body was held back because an error status is pending.
    /// Callers must treat the write as finished and stop.
    #[error("content not written")]
    ContentNotWritten,
}

/// Result type for response writes
pub type WriteResult<T> = Result<T, WriteError>;

/// ResponseWriter defines the port (interface) for building an HTTP response
/// piece by piece: headers, then status, then body.
pub trait ResponseWriter: Send {
    /// Header map of the response being written
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the response status. Only the first call takes effect.
    fn write_status(&mut self, status: StatusCode);

    /// Append a chunk to the body, returning the number of bytes accepted.
    /// Writing without a status implies `200 OK`.
    fn write(&mut self, chunk: Bytes) -> WriteResult<usize>;

    /// Hand over a streaming body. Writing without a status implies `200 OK`.
    fn write_body(&mut self, body: AxumBody) -> WriteResult<()>;
}
