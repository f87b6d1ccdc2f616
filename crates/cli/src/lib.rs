//! Shared plumbing for the `calc-client` and `calc-server` binaries.

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{CONFIG_FILE, Config, ConfigError};
pub use error::{Error, Result, report};
