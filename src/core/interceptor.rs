use axum::body::Body as AxumBody;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::ports::response_writer::{ResponseWriter, WriteError, WriteResult};

/// Wraps the real writer and holds back error responses.
///
/// Statuses below 400 and the bodies that follow them go straight through.
/// Once an error status is written nothing else reaches the real writer: the
/// status is kept here and body writes are captured into `pending_body`, so
/// the file server can still substitute its own error page.
pub struct ResponseInterceptor<'a, W: ResponseWriter> {
    inner: &'a mut W,
    status: Option<StatusCode>,
    pending_body: Bytes,
}

impl<'a, W: ResponseWriter> ResponseInterceptor<'a, W> {
    pub fn new(inner: &'a mut W) -> Self {
        Self {
            inner,
            status: None,
            pending_body: Bytes::new(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn is_error(&self) -> bool {
        self.status.is_some_and(is_error_status)
    }

    /// Body captured from the last suppressed write
    pub fn pending_body(&self) -> &Bytes {
        &self.pending_body
    }

    /// Replace the held error with another status and body
    pub fn hold_error(&mut self, status: StatusCode, body: Bytes) {
        self.status = Some(status);
        self.pending_body = body;
    }

    /// The unwrapped writer
    pub fn inner_mut(&mut self) -> &mut W {
        self.inner
    }
}

fn is_error_status(status: StatusCode) -> bool {
    status.as_u16() >= StatusCode::BAD_REQUEST.as_u16()
}

impl<W: ResponseWriter> ResponseWriter for ResponseInterceptor<'_, W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = Some(status);
        if !is_error_status(status) {
            self.inner.write_status(status);
        }
    }

    fn write(&mut self, chunk: Bytes) -> WriteResult<usize> {
        if self.is_error() {
            self.pending_body = chunk;
            return Err(WriteError::ContentNotWritten);
        }
        self.inner.write(chunk)
    }

    fn write_body(&mut self, body: AxumBody) -> WriteResult<()> {
        if self.is_error() {
            return Err(WriteError::ContentNotWritten);
        }
        self.inner.write_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::response::HttpResponseWriter;
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_success_passes_through() {
        let mut real = HttpResponseWriter::new();
        {
            let mut w = ResponseInterceptor::new(&mut real);
            w.write_status(StatusCode::OK);
            assert_eq!(w.write(Bytes::from_static(b"content")), Ok(7));
            assert!(!w.is_error());
            assert!(w.pending_body().is_empty());
        }

        let response = real.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"content");
    }

    #[test]
    fn test_write_without_status_is_forwarded() {
        let mut real = HttpResponseWriter::new();
        let mut w = ResponseInterceptor::new(&mut real);
        assert_eq!(w.write(Bytes::from_static(b"x")), Ok(1));
        assert_eq!(w.status(), None);
        assert_eq!(real.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_error_status_is_held_and_body_captured() {
        let mut real = HttpResponseWriter::new();
        {
            let mut w = ResponseInterceptor::new(&mut real);
            w.write_status(StatusCode::NOT_FOUND);
            assert!(w.is_error());

            let result = w.write(Bytes::from_static(b"404 page not found\n"));
            assert_eq!(result, Err(WriteError::ContentNotWritten));
            assert_eq!(&w.pending_body()[..], b"404 page not found\n");

            let result = w.write_body(AxumBody::from("streamed"));
            assert_eq!(result, Err(WriteError::ContentNotWritten));
        }
        assert_eq!(real.status(), None);
    }

    #[test]
    fn test_headers_always_reach_real_writer() {
        let mut real = HttpResponseWriter::new();
        {
            let mut w = ResponseInterceptor::new(&mut real);
            w.write_status(StatusCode::FORBIDDEN);
            w.headers_mut()
                .insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        }
        assert_eq!(real.headers()[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_hold_error_reclassifies() {
        let mut real = HttpResponseWriter::new();
        let mut w = ResponseInterceptor::new(&mut real);
        w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
        w.hold_error(StatusCode::FORBIDDEN, Bytes::from_static(b"403 Forbidden\n"));
        assert_eq!(w.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(&w.pending_body()[..], b"403 Forbidden\n");
    }
}
