use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body as AxumBody;
use futures_util::future::BoxFuture;
use http::header::{HeaderValue, LOCATION};
use http::uri::PathAndQuery;
use http::{Request, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use tower::Service;

use crate::adapters::file_system::LocalFileSystem;
use crate::adapters::indexed_dir::IndexedDir;
use crate::adapters::response::HttpResponseWriter;
use crate::core::error_handler::{
    ErrorHandler, ErrorHandlers, default_error_message, error_body, write_plain_error,
    write_plain_text,
};
use crate::core::interceptor::ResponseInterceptor;
use crate::core::options::ServerOption;
use crate::core::static_files::serve_file_system;
use crate::ports::response_writer::ResponseWriter;

/// One step of the dispatch chain, applied before the file is served
#[derive(Debug, Clone, PartialEq, Eq)]
enum DispatchLayer {
    StripPrefix(String),
}

#[derive(Debug, Clone)]
struct Settings {
    root: PathBuf,
    index: Vec<String>,
    auto_index: bool,
    // Innermost first; the last layer added runs first
    layers: Vec<DispatchLayer>,
    error_handlers: ErrorHandlers,
}

/// Serves a directory tree with index documents, optional listings, prefix
/// stripping and per-status error pages.
///
/// Configure it before handing it to a server. Cloning is cheap and the
/// setters copy on write, so changing a clone never affects one already
/// serving requests.
#[derive(Debug, Clone)]
pub struct FileServer {
    settings: Arc<Settings>,
}

impl FileServer {
    /// File server for `root` with the defaults: index `index.html`, no
    /// listings, no prefix, no custom error pages
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            settings: Arc::new(Settings {
                root: root.into(),
                index: vec!["index.html".to_string()],
                auto_index: false,
                layers: Vec::new(),
                error_handlers: ErrorHandlers::new(),
            }),
        }
    }

    /// File server for `root` with each option applied in order
    pub fn with_options<I>(root: impl Into<PathBuf>, options: I) -> Self
    where
        I: IntoIterator<Item = ServerOption>,
    {
        let mut server = Self::new(root);
        for option in options {
            option.apply(&mut server);
        }
        server
    }

    fn settings_mut(&mut self) -> &mut Settings {
        Arc::make_mut(&mut self.settings)
    }

    /// Set the handler for one error status
    pub fn set_error_handler(&mut self, status: StatusCode, handler: ErrorHandler) {
        self.settings_mut().error_handlers.insert(status, handler);
    }

    /// Set the handler used for error statuses without a handler of their own
    pub fn set_default_error_handler(&mut self, handler: ErrorHandler) {
        self.settings_mut().error_handlers.set_default(handler);
    }

    /// Whether directories without an index document get a listing
    pub fn set_auto_index(&mut self, enabled: bool) {
        self.settings_mut().auto_index = enabled;
    }

    /// Replace the index document names. An empty list disables index resolution.
    pub fn set_index<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings_mut().index = names.into_iter().map(Into::into).collect();
    }

    /// Strip `prefix` from request paths before serving them.
    ///
    /// Requests whose path does not start with the prefix get a 404. Each
    /// call adds a layer in front of the ones already configured.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if prefix.is_empty() {
            tracing::warn!("Ignoring empty strip prefix");
            return;
        }
        self.settings_mut()
            .layers
            .push(DispatchLayer::StripPrefix(prefix));
    }

    pub fn auto_index(mut self, enabled: bool) -> Self {
        self.set_auto_index(enabled);
        self
    }

    pub fn index<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_index(names);
        self
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.set_prefix(prefix);
        self
    }

    pub fn error_handler(mut self, status: StatusCode, handler: ErrorHandler) -> Self {
        self.set_error_handler(status, handler);
        self
    }

    pub fn default_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.set_default_error_handler(handler);
        self
    }

    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    pub fn index_names(&self) -> &[String] {
        &self.settings.index
    }

    pub fn is_auto_index(&self) -> bool {
        self.settings.auto_index
    }

    /// Configured prefixes, in the order they are stripped
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.settings.layers.iter().rev().map(|layer| match layer {
            DispatchLayer::StripPrefix(prefix) => prefix.as_str(),
        })
    }

    /// Handle `req` and return the finished response
    pub async fn handle<B>(&self, req: Request<B>) -> Response<AxumBody> {
        let (parts, _) = req.into_parts();
        let req = Request::from_parts(parts, ());

        let mut writer = HttpResponseWriter::new();
        self.handle_request(&mut writer, req).await;
        writer.into_response()
    }

    /// Handle `req`, writing the response into `w`
    pub async fn handle_request<W: ResponseWriter>(&self, w: &mut W, req: Request<()>) {
        // Index documents are only ever served through their directory
        if let Some(location) = self.index_redirect(req.uri()) {
            match HeaderValue::from_str(&location) {
                Ok(value) => {
                    tracing::debug!("Redirecting {} to {}", req.uri().path(), location);
                    w.headers_mut().insert(LOCATION, value);
                    w.write_status(StatusCode::MOVED_PERMANENTLY);
                }
                Err(err) => {
                    tracing::error!("Invalid redirect location {}: {}", location, err);
                    let status = StatusCode::INTERNAL_SERVER_ERROR;
                    write_plain_error(w, status, &default_error_message(status));
                }
            }
            return;
        }

        let mut interceptor = ResponseInterceptor::new(w);
        self.dispatch(&mut interceptor, req).await;
    }

    /// Location of the parent directory when the last path segment names an index document
    fn index_redirect(&self, uri: &Uri) -> Option<String> {
        let trimmed = uri.path().trim_end_matches('/');
        let split = trimmed.rfind('/')?;
        let (parent, base) = (&trimmed[..=split], &trimmed[split + 1..]);

        let base = percent_decode_str(base).decode_utf8().ok()?;
        if !self.settings.index.iter().any(|name| *name == base) {
            return None;
        }

        Some(match uri.query() {
            Some(query) => format!("{parent}?{query}"),
            None => parent.to_string(),
        })
    }

    async fn dispatch<W: ResponseWriter>(
        &self,
        w: &mut ResponseInterceptor<'_, W>,
        mut req: Request<()>,
    ) {
        for layer in self.settings.layers.iter().rev() {
            match layer {
                DispatchLayer::StripPrefix(prefix) => match strip_prefix(req.uri(), prefix) {
                    Some(uri) => *req.uri_mut() = uri,
                    None => {
                        tracing::debug!("{} is outside prefix {}", req.uri().path(), prefix);
                        let status = StatusCode::NOT_FOUND;
                        write_plain_error(w, status, &default_error_message(status));
                        self.handle_error(w, &req);
                        return;
                    }
                },
            }
        }

        self.serve(w, &req).await;
    }

    async fn serve<W: ResponseWriter>(&self, w: &mut ResponseInterceptor<'_, W>, req: &Request<()>) {
        let settings = &self.settings;
        let fs = IndexedDir::new(
            LocalFileSystem::new(&settings.root),
            &settings.index,
            settings.auto_index,
        );

        serve_file_system(&fs, w, req).await;

        if !w.is_error() {
            return;
        }

        // The plain handler cannot tell a refused directory from any other failure
        if fs.state().is_forbidden() {
            let status = StatusCode::FORBIDDEN;
            w.hold_error(status, error_body(&default_error_message(status)));
        }

        self.handle_error(w, req);
    }

    fn handle_error<W: ResponseWriter>(&self, w: &mut ResponseInterceptor<'_, W>, req: &Request<()>) {
        let status = w.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.settings.error_handlers.lookup(status) {
            Some(handler) => {
                tracing::debug!("Dispatching {} for {} to error handler", status, req.uri().path());
                handler.call(w.inner_mut(), req, status);
            }
            None => {
                let body = w.pending_body().clone();
                write_plain_text(w.inner_mut(), status, body);
            }
        }
    }
}

/// `uri` with `prefix` removed from its path, or `None` if the path lies outside it
fn strip_prefix(uri: &Uri, prefix: &str) -> Option<Uri> {
    let rest = uri.path().strip_prefix(prefix)?;
    let path = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    };

    match replace_path(uri, &path) {
        Ok(uri) => Some(uri),
        Err(err) => {
            tracing::warn!("Failed to rewrite {} to {}: {}", uri, path, err);
            None
        }
    }
}

fn replace_path(uri: &Uri, path: &str) -> Result<Uri, http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

impl<B> Service<Request<B>> for FileServer
where
    B: Send + 'static,
{
    type Response = Response<AxumBody>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let server = self.clone();
        Box::pin(async move { Ok(server.handle(req).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::{with_auto_index, with_index, with_prefix};

    #[test]
    fn test_defaults() {
        let server = FileServer::new("/srv");
        assert_eq!(server.root(), Path::new("/srv"));
        assert_eq!(server.index_names(), ["index.html"]);
        assert!(!server.is_auto_index());
        assert_eq!(server.prefixes().count(), 0);
    }

    #[test]
    fn test_options_apply_in_order() {
        let server = FileServer::with_options(
            "/srv",
            [
                with_index(["a.html"]),
                with_auto_index(true),
                with_index(["b.html", "c.html"]),
                with_prefix("/inner"),
                with_prefix("/outer"),
            ],
        );
        assert_eq!(server.index_names(), ["b.html", "c.html"]);
        assert!(server.is_auto_index());
        assert_eq!(server.prefixes().collect::<Vec<_>>(), vec!["/outer", "/inner"]);
    }

    #[test]
    fn test_empty_prefix_adds_no_layer() {
        let server = FileServer::new("/srv").strip_prefix("");
        assert_eq!(server.prefixes().count(), 0);
    }

    #[test]
    fn test_setters_copy_on_write() {
        let original = FileServer::new("/srv");
        let changed = original.clone().auto_index(true);
        assert!(!original.is_auto_index());
        assert!(changed.is_auto_index());
    }

    #[test]
    fn test_index_redirect_targets_parent() {
        let server = FileServer::new("/srv");
        let uri = |s: &str| s.parse::<Uri>().unwrap();

        assert_eq!(server.index_redirect(&uri("/index.html")), Some("/".to_string()));
        assert_eq!(
            server.index_redirect(&uri("/docs/index.html?lang=en")),
            Some("/docs/?lang=en".to_string())
        );
        assert_eq!(
            server.index_redirect(&uri("/docs/index%2Ehtml")),
            Some("/docs/".to_string())
        );
        assert_eq!(server.index_redirect(&uri("/")), None);
        assert_eq!(server.index_redirect(&uri("/docs/")), None);
        assert_eq!(server.index_redirect(&uri("/index.htm")), None);
    }

    #[test]
    fn test_strip_prefix() {
        let uri = "/static/css/site.css?v=2".parse::<Uri>().unwrap();
        let stripped = strip_prefix(&uri, "/static").unwrap();
        assert_eq!(stripped.path(), "/css/site.css");
        assert_eq!(stripped.query(), Some("v=2"));

        let bare = strip_prefix(&"/static".parse().unwrap(), "/static").unwrap();
        assert_eq!(bare.path(), "/");

        assert!(strip_prefix(&"/other/a.txt".parse().unwrap(), "/static").is_none());
    }
}
