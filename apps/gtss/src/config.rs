//! # Configuration
//!
//! Settings are resolved in three layers, later layers winning:
//! 1. an optional TOML file (`--config`, or `gtss.toml` in the working
//!    directory when present)
//! 2. environment variables `GTSS_HOST`, `GTSS_PORT`, `GTSS_DATABASE`,
//!    `GTSS_BACKEND`, `GTSS_CORS_ORIGINS`
//! 3. CLI flags
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8080
//! database = "inventory.redb"
//! backend = "redb"
//! cors_origins = "https://signals.example.gov"
//! ```

use clap::ValueEnum;
use gtss_core::GtssError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gtss.toml";

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb key-value database (ACID, every mutation persisted)
    #[default]
    Redb,
    /// Snapshot file written after each CLI mutation
    File,
}

impl Backend {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Redb => "redb",
            Self::File => "file",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = GtssError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "file" => Ok(Self::File),
            other => Err(GtssError::validation(
                "backend",
                format!("unknown backend '{other}' (expected redb or file)"),
            )),
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub backend: Backend,
    /// Comma-separated allowed origins, or `*`. `None` means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: PathBuf::from("gtss.redb"),
            backend: Backend::Redb,
            cors_origins: None,
        }
    }
}

impl Config {
    /// Parse a TOML document. Absent keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, GtssError> {
        toml::from_str(source).map_err(|e| GtssError::validation("config", e.to_string()))
    }

    /// Load the file layer.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_file(path: Option<&Path>) -> Result<Self, GtssError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let source = std::fs::read_to_string(&path).map_err(|e| {
            GtssError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), GtssError> {
        if let Some(host) = lookup("GTSS_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("GTSS_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| GtssError::validation("GTSS_PORT", format!("'{port}' is not a port")))?;
        }
        if let Some(database) = lookup("GTSS_DATABASE") {
            self.database = PathBuf::from(database);
        }
        if let Some(backend) = lookup("GTSS_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(origins) = lookup("GTSS_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<(), GtssError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.backend, Backend::Redb);
        assert!(config.cors_origins.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("port = 9000\nbackend = \"file\"\n").expect("parse");
        assert_eq!(config.port, 9000);
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn unknown_toml_key_rejected() {
        assert!(Config::from_toml_str("prot = 9000\n").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("GTSS_PORT", "7070"),
            ("GTSS_BACKEND", "FILE"),
            ("GTSS_CORS_ORIGINS", "*"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_toml_str("port = 9000\n").expect("parse");
        config
            .apply_env(|key| env.get(key).map(|v| (*v).to_string()))
            .expect("apply");

        assert_eq!(config.port, 7070);
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.cors_origins.as_deref(), Some("*"));
    }

    #[test]
    fn bad_env_port_rejected() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "GTSS_PORT").then(|| "eighty".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let missing = temp.path().join("absent.toml");
        assert!(Config::load_file(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_file_loaded() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("gtss.toml");
        std::fs::write(&path, "host = \"0.0.0.0\"\n").expect("write");
        let config = Config::load_file(Some(&path)).expect("load");
        assert_eq!(config.host, "0.0.0.0");
    }
}
