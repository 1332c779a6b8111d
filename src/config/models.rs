use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ERROR_PAGE_KEY: &str = "default";

fn default_index() -> Vec<String> {
    vec!["index.html".to_string()]
}

fn default_content_type() -> String {
    "text/html; charset=utf-8".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub root: String,
    #[serde(default = "default_index")]
    pub index: Vec<String>,
    #[serde(default)]
    pub autoindex: bool,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub error_pages: HashMap<ErrorPageKey, ErrorPageConfig>,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ServerConfigBuilder {
    listen_addr: Option<String>,
    root: Option<String>,
    index: Option<Vec<String>>,
    autoindex: bool,
    prefix: Option<String>,
    error_pages: HashMap<ErrorPageKey, ErrorPageConfig>,
}

impl ServerConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            listen_addr: Some(config.listen_addr),
            root: Some(config.root),
            index: Some(config.index),
            autoindex: config.autoindex,
            prefix: config.prefix,
            error_pages: config.error_pages,
        }
    }

    /// Set the listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the directory to serve
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Replace the index document names
    pub fn index(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.index = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable directory listings
    pub fn autoindex(mut self, enabled: bool) -> Self {
        self.autoindex = enabled;
        self
    }

    /// Set the prefix stripped from request paths
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an error page for one status
    pub fn error_page(mut self, status: u16, page: ErrorPageConfig) -> Self {
        self.error_pages.insert(ErrorPageKey::Status(status), page);
        self
    }

    /// Add the error page used for statuses without a page of their own
    pub fn default_error_page(mut self, page: ErrorPageConfig) -> Self {
        self.error_pages
            .insert(ErrorPageKey::Name(DEFAULT_ERROR_PAGE_KEY.to_string()), page);
        self
    }

    /// Build the final ServerConfig
    pub fn build(self) -> Result<ServerConfig, String> {
        let root = self.root.ok_or_else(|| "root is required".to_string())?;

        Ok(ServerConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            root,
            index: self.index.unwrap_or_else(default_index),
            autoindex: self.autoindex,
            prefix: self.prefix,
            error_pages: self.error_pages,
        })
    }
}

/// Key of an `error_pages` entry: a status code or `default`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPageKey {
    Status(u16),
    Name(String),
}

impl ErrorPageKey {
    /// The status this page is for, `None` for the default page
    pub fn status(&self) -> Result<Option<StatusCode>, String> {
        let code = match self {
            ErrorPageKey::Status(code) => *code,
            ErrorPageKey::Name(name) if name == DEFAULT_ERROR_PAGE_KEY => return Ok(None),
            ErrorPageKey::Name(name) => name
                .parse::<u16>()
                .map_err(|_| format!("expected a status code or '{DEFAULT_ERROR_PAGE_KEY}'"))?,
        };

        let status = StatusCode::from_u16(code).map_err(|e| e.to_string())?;
        if !status.is_client_error() && !status.is_server_error() {
            return Err(format!("{code} is not an error status"));
        }
        Ok(Some(status))
    }
}

impl fmt::Display for ErrorPageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPageKey::Status(code) => write!(f, "{code}"),
            ErrorPageKey::Name(name) => write!(f, "{name}"),
        }
    }
}

/// An error page served from a file or an inline body
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorPageConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl ErrorPageConfig {
    /// Create an error page read from `path` at startup
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            body: None,
            content_type: default_content_type(),
        }
    }

    /// Create an error page with an inline body
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            file: None,
            body: Some(body.into()),
            content_type: default_content_type(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}
