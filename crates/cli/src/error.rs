//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The logging subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    /// The operation registry could not be built.
    #[error(transparent)]
    Registry(#[from] registry::RegistryError),

    /// The session driver failed.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The MCP session could not be started or ended abnormally.
    #[error("failed to serve: {0}")]
    Serve(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Print `error` and its source chain to stderr.
///
/// Sources whose message is already part of the previous line are skipped.
pub fn report(context: &str, error: &dyn std::error::Error) {
    let mut last = error.to_string();
    eprintln!("{context}: {last}");

    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !last.contains(&message) {
            eprintln!("  caused by: {message}");
        }
        last = message;
        source = cause.source();
    }
}
