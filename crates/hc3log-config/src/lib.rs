//! Configuration for the hc3log viewer.
//!
//! A small TOML file plus `HC3_`-prefixed environment variables, merged
//! with figment (env wins), translated to `hc3log_core::ConnectionConfig`.
//! Credential presence is not enforced here — the core reports missing
//! credentials as a connection-time error so the UI stays interactive.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hc3log_core::{ConnectionConfig, Scheme};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// On-disk / environment configuration, before translation to the
/// runtime [`ConnectionConfig`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FileConfig {
    /// Controller host (IP or hostname, no scheme).
    pub host: Option<String>,

    /// Basic-auth username.
    pub user: Option<String>,

    /// Basic-auth password (plaintext — prefer the env var).
    pub password: Option<String>,

    /// "http" (default) or "https".
    pub protocol: Option<String>,

    /// Server-side long-poll hold time in seconds.
    pub hold_secs: Option<u64>,

    /// Client-side request timeout in seconds for non-streaming requests.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hc3log", "hc3log").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hc3log");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from file + environment. Environment variables
/// (`HC3_HOST`, `HC3_USER`, `HC3_PASSWORD`, `HC3_PROTOCOL`) override the
/// file, matching how the controller tooling is usually configured.
pub fn load_config() -> Result<FileConfig, ConfigError> {
    load_from(Toml::file(config_path()))
}

fn load_from(
    file: figment::providers::Data<figment::providers::Toml>,
) -> Result<FileConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(FileConfig::default()))
        .merge(file)
        .merge(Env::prefixed("HC3_"));
    Ok(figment.extract()?)
}

/// Load config, returning defaults when the file doesn't exist.
pub fn load_config_or_default() -> FileConfig {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &FileConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl FileConfig {
    /// Build the runtime connection config. Absent fields become empty
    /// strings so the core can report exactly which are missing; an
    /// unrecognized protocol is the one hard error here.
    pub fn to_connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        let scheme = match self.protocol.as_deref() {
            None | Some("") => Scheme::Http,
            Some(p) => p.parse::<Scheme>().map_err(|e| ConfigError::Validation {
                field: "protocol".into(),
                reason: e.to_string(),
            })?,
        };
        Ok(ConnectionConfig {
            host: self.host.clone().unwrap_or_default(),
            username: self.user.clone().unwrap_or_default(),
            password: SecretString::from(self.password.clone().unwrap_or_default()),
            scheme,
            hold_secs: self.hold_secs.unwrap_or(30),
            timeout: Some(Duration::from_secs(self.timeout.unwrap_or(30))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hc3log_core::Scheme;

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    host = "10.0.0.2"
                    user = "filed"
                "#,
            )?;
            jail.set_env("HC3_HOST", "192.168.1.57");
            jail.set_env("HC3_PASSWORD", "hunter2");

            let config = load_from(Toml::file("config.toml")).expect("config loads");
            assert_eq!(config.host.as_deref(), Some("192.168.1.57"));
            assert_eq!(config.user.as_deref(), Some("filed"));
            assert_eq!(config.password.as_deref(), Some("hunter2"));
            Ok(())
        });
    }

    #[test]
    fn protocol_defaults_to_http() {
        let config = FileConfig {
            host: Some("hc3.local".into()),
            user: Some("admin".into()),
            password: Some("pw".into()),
            ..FileConfig::default()
        };
        let conn = config.to_connection_config().expect("valid");
        assert_eq!(conn.scheme, Scheme::Http);
        assert_eq!(conn.hold_secs, 30);
    }

    #[test]
    fn https_protocol_is_accepted() {
        let config = FileConfig {
            protocol: Some("https".into()),
            ..FileConfig::default()
        };
        let conn = config.to_connection_config().expect("valid");
        assert_eq!(conn.scheme, Scheme::Https);
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let config = FileConfig {
            protocol: Some("gopher".into()),
            ..FileConfig::default()
        };
        let err = config.to_connection_config().expect_err("invalid protocol");
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn missing_credentials_translate_to_empty_fields() {
        let config = FileConfig::default();
        let conn = config.to_connection_config().expect("translation succeeds");
        assert!(conn.host.is_empty());
        assert!(conn.validate().is_err());
    }
}
