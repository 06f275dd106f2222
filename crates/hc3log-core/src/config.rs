// ── Runtime connection configuration ──
//
// Describes *how* to reach an HC3 controller. Carries credential data
// and stream tuning, but never touches disk — hc3log-config builds a
// `ConnectionConfig` from file/env and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::CoreError;

/// URL scheme for reaching the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(CoreError::Config {
                message: format!("unsupported protocol {other:?}, expected http or https"),
            }),
        }
    }
}

/// Configuration for connecting to a single HC3 controller.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Controller host (IP or hostname, no scheme).
    pub host: String,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: SecretString,
    /// `http` (default) or `https`.
    pub scheme: Scheme,
    /// Server-side hold time for the long-poll, in seconds.
    pub hold_secs: u64,
    /// Client-side request timeout for non-streaming requests.
    pub timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Check that every credential field is present.
    ///
    /// Missing fields are a reported configuration error, never a panic:
    /// the caller surfaces the message and stays interactive.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.username.trim().is_empty() {
            missing.push("user");
        }
        if self.password.expose_secret().is_empty() {
            missing.push("password");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config {
                message: format!("missing credentials: {}", missing.join(", ")),
            })
        }
    }

    /// Base URL for the controller: `{scheme}://{host}`.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Url::parse(&format!("{}://{}", self.scheme.as_str(), self.host)).map_err(|e| {
            CoreError::Config {
                message: format!("invalid host {:?}: {e}", self.host),
            }
        })
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            scheme: Scheme::default(),
            hold_secs: 30,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_all_missing_fields() {
        let config = ConnectionConfig::default();
        let err = config.validate().expect_err("empty config is invalid");
        let message = err.to_string();
        assert!(message.contains("host"));
        assert!(message.contains("user"));
        assert!(message.contains("password"));
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = ConnectionConfig {
            host: "192.168.1.57".into(),
            username: "admin".into(),
            password: SecretString::from("secret".to_string()),
            ..ConnectionConfig::default()
        };
        config.validate().expect("complete config is valid");
        assert_eq!(
            config.base_url().expect("valid url").as_str(),
            "http://192.168.1.57/"
        );
    }
}
