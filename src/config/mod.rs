pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigError, ConfigResult, build_file_server, load_config};
pub use models::{ErrorPageConfig, ErrorPageKey, ServerConfig, ServerConfigBuilder};
pub use validation::{ConfigValidator, ValidationError};
