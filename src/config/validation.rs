use http::StatusCode;
use http::header::HeaderValue;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::models::{DEFAULT_ERROR_PAGE_KEY, ErrorPageConfig, ErrorPageKey, ServerConfig};

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid listen address: {address} - {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validator with detailed error reporting
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete server configuration
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_root(&config.root) {
            errors.push(e);
        }

        if let Err(mut index_errors) = Self::validate_index(&config.index) {
            errors.append(&mut index_errors);
        }

        if let Some(prefix) = &config.prefix {
            if let Err(e) = Self::validate_prefix(prefix) {
                errors.push(e);
            }
        }

        for (key, page) in &config.error_pages {
            if let Err(mut page_errors) = Self::validate_error_page(key, page) {
                errors.append(&mut page_errors);
            }
        }

        if let Err(mut duplicate_errors) = Self::validate_unique_error_pages(config) {
            errors.append(&mut duplicate_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// The served root must be an existing directory
    fn validate_root(root: &str) -> ValidationResult<()> {
        if root.is_empty() {
            return Err(ValidationError::MissingField {
                field: "root".to_string(),
            });
        }

        let path = Path::new(root);
        if !path.exists() {
            return Err(ValidationError::FileNotFound {
                path: root.to_string(),
            });
        }
        if !path.is_dir() {
            return Err(ValidationError::InvalidField {
                field: "root".to_string(),
                message: format!("'{root}' is not a directory"),
            });
        }
        Ok(())
    }

    /// Index names are single file names; an empty list is allowed
    fn validate_index(index: &[String]) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = index
            .iter()
            .filter(|name| name.is_empty() || name.contains('/') || *name == "." || *name == "..")
            .map(|name| ValidationError::InvalidField {
                field: format!("index: '{name}'"),
                message: "Index names must be plain file names".to_string(),
            })
            .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_prefix(prefix: &str) -> ValidationResult<()> {
        if prefix.is_empty() || !prefix.starts_with('/') {
            return Err(ValidationError::InvalidField {
                field: format!("prefix: '{prefix}'"),
                message: "Prefix must start with '/'".to_string(),
            });
        }
        Ok(())
    }

    fn validate_error_page(
        key: &ErrorPageKey,
        page: &ErrorPageConfig,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let field = format!("error_pages.{key}");

        if let Err(message) = key.status() {
            errors.push(ValidationError::InvalidField {
                field: field.clone(),
                message,
            });
        }

        match (&page.file, &page.body) {
            (Some(path), None) => {
                if !Path::new(path).is_file() {
                    errors.push(ValidationError::FileNotFound { path: path.clone() });
                }
            }
            (None, Some(_)) => {}
            _ => errors.push(ValidationError::InvalidField {
                field: field.clone(),
                message: "Exactly one of 'file' or 'body' must be set".to_string(),
            }),
        }

        if HeaderValue::from_str(&page.content_type).is_err() {
            errors.push(ValidationError::InvalidField {
                field: format!("{field}.content_type"),
                message: format!("'{}' is not a valid header value", page.content_type),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// `404` and `"404"` are distinct keys that name the same status
    fn validate_unique_error_pages(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
        let mut by_status: HashMap<Option<StatusCode>, Vec<String>> = HashMap::new();
        for key in config.error_pages.keys() {
            if let Ok(status) = key.status() {
                by_status.entry(status).or_default().push(key.to_string());
            }
        }

        let mut errors: Vec<_> = by_status
            .into_iter()
            .filter(|(_, keys)| keys.len() > 1)
            .map(|(status, _)| {
                let name = status.map_or_else(|| DEFAULT_ERROR_PAGE_KEY.to_string(), |s| s.as_u16().to_string());
                ValidationError::InvalidField {
                    field: format!("error_pages.{name}"),
                    message: "Error page is configured more than once".to_string(),
                }
            })
            .collect();
        errors.sort_by_key(|e| e.to_string());

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Format multiple validation errors into a readable message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} configuration errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
