//! Configuration loading from calc.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mcp::{DEFAULT_TIMEOUT, ServerConfig};
use serde::Deserialize;

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "calc.toml";

/// File name of the server binary, expected next to the client.
pub const SERVER_BINARY: &str = "calc-server";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// How to launch the server.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging.
    #[serde(default)]
    pub log: LogSection,
}

/// Server launch configuration.
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Server executable. Defaults to `calc-server` next to the running binary.
    pub command: Option<PathBuf>,

    /// Extra arguments for the server.
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Logging configuration.
#[derive(Debug, Default, Deserialize)]
pub struct LogSection {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if given, else [`CONFIG_FILE`] if present, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Build the launch configuration for the server.
    ///
    /// `command` overrides the configured executable. The result always
    /// names the executable by absolute path and adds no environment.
    pub fn server_config(&self, command: Option<PathBuf>) -> Result<ServerConfig, ConfigError> {
        if self.server.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let command = match command.or_else(|| self.server.command.clone()) {
            Some(path) => path,
            None => default_server_path()?,
        };
        let command = std::path::absolute(&command)?;

        Ok(
            ServerConfig::new(SERVER_BINARY, command.to_string_lossy())
                .with_args(self.server.args.iter().cloned())
                .with_timeout(Duration::from_secs(self.server.timeout_secs)),
        )
    }
}

/// `calc-server` in the directory of the running executable.
pub fn default_server_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| {
        ConfigError::Invalid(format!("{} has no parent directory", exe.display()))
    })?;
    Ok(dir.join(format!("{SERVER_BINARY}{}", std::env::consts::EXE_SUFFIX)))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.server.command.is_none());
        assert!(config.server.args.is_empty());
        assert_eq!(config.server.timeout_secs, 15);
        assert!(config.log.filter.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[server]
command = "/opt/calc/calc-server"
args = ["--flag"]
timeout_secs = 3

[log]
filter = "debug"
"#;
        let config = Config::parse(toml).unwrap();
        let server = config.server_config(None).unwrap();
        assert_eq!(server.command, "/opt/calc/calc-server");
        assert_eq!(server.args, vec!["--flag".to_string()]);
        assert_eq!(server.timeout, Duration::from_secs(3));
        assert!(server.env.is_empty());
        assert_eq!(config.log.filter.as_deref(), Some("debug"));
    }

    #[test]
    fn override_wins_and_is_absolute() {
        let config = Config::parse("[server]\ncommand = \"/opt/calc/calc-server\"").unwrap();
        let server = config
            .server_config(Some(PathBuf::from("bin/calc-server")))
            .unwrap();
        assert!(Path::new(&server.command).is_absolute());
        assert!(server.command.ends_with("calc-server"));
        assert_ne!(server.command, "/opt/calc/calc-server");
    }

    #[test]
    fn default_server_sits_next_to_current_exe() {
        let path = default_server_path().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(path.parent(), exe.parent());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config::parse("[server]\ntimeout_secs = 0").unwrap();
        assert!(matches!(config.server_config(None), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(Config::parse("[server"), Err(ConfigError::Parse(_))));
    }
}
