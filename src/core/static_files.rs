//! The plain static file handler the file server decorates.
//!
//! It knows nothing about error pages or listing policy: it opens whatever the
//! request names through a [`FileSystem`], answers with the file, a listing or
//! a plain-text error, and writes everything through a [`ResponseWriter`].

use std::io::ErrorKind;

use axum::body::Body as AxumBody;
use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, HeaderValue, LOCATION};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::core::error_handler::{default_error_message, write_plain_error};
use crate::core::listing::render_listing;
use crate::ports::file_system::{FileSystem, FileSystemError, FsEntry};
use crate::ports::response_writer::ResponseWriter;

/// Status the handler reports for a failed open
pub fn status_for_error(err: &FileSystemError) -> StatusCode {
    match err {
        FileSystemError::IoError(io) => match io.kind() {
            ErrorKind::NotFound | ErrorKind::NotADirectory => StatusCode::NOT_FOUND,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        FileSystemError::InvalidPath(_) => StatusCode::NOT_FOUND,
        // Policy refusals are not an OS error, so they get the generic status
        FileSystemError::Forbidden => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Serve the file, index document or listing named by `req` from `fs`
pub async fn serve_file_system<F, W>(fs: &F, w: &mut W, req: &Request<()>)
where
    F: FileSystem,
    W: ResponseWriter,
{
    let raw_path = req.uri().path();
    let name = match percent_decode_str(raw_path).decode_utf8() {
        Ok(name) => name.into_owned(),
        Err(_) => {
            write_plain_error(w, StatusCode::BAD_REQUEST, "400 Bad Request: invalid path encoding");
            return;
        }
    };

    let entry = match fs.open(&name).await {
        Ok(entry) => entry,
        Err(err) => {
            tracing::debug!("Failed to open {}: {}", name, err);
            let status = status_for_error(&err);
            write_plain_error(w, status, &default_error_message(status));
            return;
        }
    };

    // Relative links inside listings and index pages need the trailing slash
    if (entry.is_dir() || entry.is_directory_index()) && !raw_path.ends_with('/') {
        let base = raw_path.rsplit('/').next().unwrap_or_default();
        local_redirect(w, req, &format!("{base}/"));
        return;
    }

    if entry.is_dir() {
        serve_listing(fs, w, &entry).await;
    } else {
        serve_file(w, req, &entry).await;
    }
}

/// Permanent redirect to a location relative to the current path, keeping the query
fn local_redirect<W: ResponseWriter>(w: &mut W, req: &Request<()>, target: &str) {
    let location = match req.uri().query() {
        Some(query) => format!("{target}?{query}"),
        None => target.to_string(),
    };

    match HeaderValue::from_str(&location) {
        Ok(value) => {
            w.headers_mut().insert(LOCATION, value);
            w.write_status(StatusCode::MOVED_PERMANENTLY);
        }
        Err(err) => {
            tracing::error!("Invalid redirect location {}: {}", location, err);
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            write_plain_error(w, status, &default_error_message(status));
        }
    }
}

async fn serve_listing<F, W>(fs: &F, w: &mut W, dir: &FsEntry)
where
    F: FileSystem,
    W: ResponseWriter,
{
    let entries = match fs.read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!("Error reading directory {}: {}", dir.path().display(), err);
            write_plain_error(w, StatusCode::INTERNAL_SERVER_ERROR, "Error reading directory");
            return;
        }
    };

    w.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    w.write_status(StatusCode::OK);
    if let Err(err) = w.write(Bytes::from(render_listing(&entries))) {
        tracing::trace!("Listing not written: {}", err);
    }
}

async fn serve_file<W: ResponseWriter>(w: &mut W, req: &Request<()>, entry: &FsEntry) {
    let mut file_req = Request::new(AxumBody::empty());
    *file_req.method_mut() = req.method().clone();
    *file_req.uri_mut() = req.uri().clone();
    *file_req.version_mut() = req.version();
    *file_req.headers_mut() = req.headers().clone();

    let response = match ServeFile::new(entry.path()).oneshot(file_req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let (parts, body) = response.into_parts();

    if parts.status.as_u16() < StatusCode::BAD_REQUEST.as_u16() {
        w.headers_mut().extend(parts.headers);
        w.write_status(parts.status);
        let body = AxumBody::new(body.map_err(|e| {
            tracing::error!("Error reading static file body: {}", e);
            axum::Error::new(e)
        }));
        if let Err(err) = w.write_body(body) {
            tracing::trace!("File body not written: {}", err);
        }
        return;
    }

    // File metadata headers describe a body that is not sent; only Allow survives
    tracing::debug!("File service answered {} for {}", parts.status, entry.path().display());
    if let Some(allow) = parts.headers.get(ALLOW) {
        w.headers_mut().insert(ALLOW, allow.clone());
    }
    write_plain_error(w, parts.status, &default_error_message(parts.status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_system::LocalFileSystem;
    use crate::adapters::response::HttpResponseWriter;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("x y.txt"), "spaced").unwrap();
        dir
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn serve(dir: &TempDir, uri: &str) -> (StatusCode, http::HeaderMap, Bytes) {
        let fs = LocalFileSystem::new(dir.path());
        let mut w = HttpResponseWriter::new();
        serve_file_system(&fs, &mut w, &get(uri)).await;
        let response = w.into_response();
        let (parts, body) = response.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, body)
    }

    #[tokio::test]
    async fn test_serves_file() {
        let dir = fixture();
        let (status, headers, body) = serve(&dir, "/hello.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"hello");
        assert!(headers[CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_percent_encoded_names() {
        let dir = fixture();
        let (status, _, body) = serve(&dir, "/sub/x%20y.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"spaced");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = fixture();
        let (status, headers, body) = serve(&dir, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"404 page not found\n");
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let dir = fixture();
        let fs = LocalFileSystem::new(dir.path());
        let mut w = HttpResponseWriter::new();
        serve_file_system(&fs, &mut w, &get("/sub?sort=name")).await;
        assert_eq!(w.status(), Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(w.headers()[LOCATION], "sub/?sort=name");
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let dir = fixture();
        let (status, headers, body) = serve(&dir, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html; charset=utf-8");
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<a href=\"hello.txt\">hello.txt</a>"));
        assert!(html.contains("<a href=\"sub/\">sub/</a>"));
    }

    async fn serve_request(dir: &TempDir, req: Request<()>) -> (StatusCode, http::HeaderMap, Bytes) {
        let fs = LocalFileSystem::new(dir.path());
        let mut w = HttpResponseWriter::new();
        serve_file_system(&fs, &mut w, &req).await;
        let (parts, body) = w.into_response().into_parts();
        (parts.status, parts.headers, body.collect().await.unwrap().to_bytes())
    }

    #[tokio::test]
    async fn test_file_service_errors_get_default_message() {
        let dir = fixture();

        let post = Request::builder()
            .method("POST")
            .uri("/hello.txt")
            .body(())
            .unwrap();
        let (status, headers, body) = serve_request(&dir, post).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(&body[..], b"405 Method Not Allowed\n");
        assert_eq!(headers[CONTENT_TYPE], "text/plain; charset=utf-8");
        assert!(headers.contains_key(ALLOW));
        assert!(!headers.contains_key(http::header::LAST_MODIFIED));

        let ranged = Request::builder()
            .uri("/hello.txt")
            .header(http::header::RANGE, "bytes=100-200")
            .body(())
            .unwrap();
        let (status, headers, body) = serve_request(&dir, ranged).await;
        assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(&body[..], b"416 Range Not Satisfiable\n");
        assert!(!headers.contains_key(http::header::CONTENT_RANGE));
        assert!(!headers.contains_key(http::header::ACCEPT_RANGES));
    }

    #[test]
    fn test_status_for_policy_error_is_generic() {
        assert_eq!(
            status_for_error(&FileSystemError::Forbidden),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert_eq!(
            status_for_error(&FileSystemError::IoError(denied)),
            StatusCode::FORBIDDEN
        );
    }
}
