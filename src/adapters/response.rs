use axum::body::Body as AxumBody;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};

use crate::ports::response_writer::{ResponseWriter, WriteResult};

enum PendingBody {
    Empty,
    Buffered(BytesMut),
    Streaming(AxumBody),
}

/// The real transport writer: collects status, headers and body and turns
/// them into an `http::Response` once the handler is done.
pub struct HttpResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: PendingBody,
}

impl Default for HttpResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponseWriter {
    pub fn new() -> Self {
        Self {
            status: None,
            headers: HeaderMap::new(),
            body: PendingBody::Empty,
        }
    }

    /// Status written so far, if any
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn ensure_status(&mut self) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
    }

    pub fn into_response(self) -> Response<AxumBody> {
        let body = match self.body {
            PendingBody::Empty => AxumBody::empty(),
            PendingBody::Buffered(buf) => AxumBody::from(buf.freeze()),
            PendingBody::Streaming(body) => body,
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for HttpResponseWriter {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => {
                tracing::warn!(
                    "Superfluous status write: {} ignored, response already has {}",
                    status,
                    current
                );
            }
            None => self.status = Some(status),
        }
    }

    fn write(&mut self, chunk: Bytes) -> WriteResult<usize> {
        self.ensure_status();
        let written = chunk.len();
        match &mut self.body {
            PendingBody::Empty => self.body = PendingBody::Buffered(BytesMut::from(&chunk[..])),
            PendingBody::Buffered(buf) => buf.extend_from_slice(&chunk),
            PendingBody::Streaming(_) => {
                tracing::warn!("Dropping {} bytes written after a streaming body", written);
                return Ok(0);
            }
        }
        Ok(written)
    }

    fn write_body(&mut self, body: AxumBody) -> WriteResult<()> {
        self.ensure_status();
        if !matches!(self.body, PendingBody::Empty) {
            tracing::warn!("Replacing previously written response body");
        }
        self.body = PendingBody::Streaming(body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_buffered_writes_are_concatenated() {
        let mut writer = HttpResponseWriter::new();
        assert_eq!(writer.write(Bytes::from_static(b"hello ")), Ok(6));
        assert_eq!(writer.write(Bytes::from_static(b"world")), Ok(5));
        assert_eq!(writer.status(), Some(StatusCode::OK));

        let response = writer.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"hello world");
    }

    #[test]
    fn test_first_status_wins() {
        let mut writer = HttpResponseWriter::new();
        writer.write_status(StatusCode::NOT_FOUND);
        writer.write_status(StatusCode::OK);
        assert_eq!(writer.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn test_empty_writer_defaults_to_ok() {
        let response = HttpResponseWriter::default().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_body_ignores_later_chunks() {
        let mut writer = HttpResponseWriter::new();
        writer.write_body(AxumBody::from("streamed")).unwrap();
        assert_eq!(writer.write(Bytes::from_static(b"late")), Ok(0));

        let body = writer
            .into_response()
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(&body[..], b"streamed");
    }
}
