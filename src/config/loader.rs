use bytes::Bytes;
use http::header::HeaderValue;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

use crate::config::models::{ErrorPageConfig, ServerConfig};
use crate::core::{ErrorHandler, FileServer};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Failed to read error page {path}: {source}")]
    ErrorPage {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid error page '{key}': {message}")]
    InvalidErrorPage { key: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub async fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<ServerConfig> {
    let config_content = fs::read_to_string(path).await?;
    let config: ServerConfig = serde_yaml::from_str(&config_content)?;
    Ok(config)
}

/// Turn a configuration into a ready file server, reading error pages into memory
pub async fn build_file_server(config: &ServerConfig) -> ConfigResult<FileServer> {
    let mut server = FileServer::new(&config.root)
        .index(config.index.iter().cloned())
        .auto_index(config.autoindex);

    if let Some(prefix) = &config.prefix {
        server.set_prefix(prefix.clone());
    }

    let mut configured = HashSet::new();
    for (key, page) in &config.error_pages {
        let invalid = |message: String| ConfigError::InvalidErrorPage {
            key: key.to_string(),
            message,
        };
        let status = key.status().map_err(invalid)?;
        if !configured.insert(status) {
            return Err(invalid("error page is configured more than once".to_string()));
        }
        let handler = load_error_page(page).await.map_err(|err| match err {
            ConfigError::InvalidErrorPage { message, .. } => invalid(message),
            other => other,
        })?;

        match status {
            Some(status) => {
                tracing::info!("Configured error page for {}", status);
                server.set_error_handler(status, handler);
            }
            None => {
                tracing::info!("Configured default error page");
                server.set_default_error_handler(handler);
            }
        }
    }

    Ok(server)
}

async fn load_error_page(page: &ErrorPageConfig) -> ConfigResult<ErrorHandler> {
    let content_type = HeaderValue::from_str(&page.content_type).map_err(|e| {
        ConfigError::InvalidErrorPage {
            key: String::new(),
            message: format!("invalid content_type: {e}"),
        }
    })?;

    let body = match (&page.file, &page.body) {
        (Some(path), None) => {
            let content = fs::read(path).await.map_err(|source| ConfigError::ErrorPage {
                path: path.clone(),
                source,
            })?;
            Bytes::from(content)
        }
        (None, Some(body)) => Bytes::from(body.clone()),
        _ => {
            return Err(ConfigError::InvalidErrorPage {
                key: String::new(),
                message: "exactly one of 'file' or 'body' must be set".to_string(),
            });
        }
    };

    Ok(ErrorHandler::static_page(content_type, body))
}
