//! Process-level runtime helpers: layered configuration, home directory
//! resolution and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, DatabaseConfig, LogSection, LoggingConfig, Overrides,
    ServerConfig,
};
