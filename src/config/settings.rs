//! Process settings, read from flags or the environment (`.env` honoured by the binary).

use crate::error::ConfigError;
use clap::{Args, ValueEnum};
use std::net::SocketAddr;

/// How duplicate client emails are detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmailUniqueness {
    /// Single insert; only safe when the table carries a unique constraint on `email`.
    Storage,
    /// Look the email up before writing. A unique violation on insert still becomes 409.
    #[default]
    Precheck,
}

/// Connection to the managed backend. Both values are mandatory.
#[derive(Clone, Debug, Args)]
pub struct BackendArgs {
    /// Base URL of the managed backend, e.g. https://xyz.example.co
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Access key sent with every backend request.
    #[arg(long, env = "BACKEND_KEY", hide_env_values = true)]
    pub backend_key: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    /// Query the platform's Postgres directly instead of its REST API.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DATABASE_SCHEMA", default_value = "public")]
    pub database_schema: String,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5)]
    pub database_max_connections: u32,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "EMAIL_UNIQUENESS", value_enum, default_value_t = EmailUniqueness::Precheck)]
    pub email_uniqueness: EmailUniqueness,

    /// Maximum accepted request body, in bytes.
    #[arg(long, env = "REQUEST_BODY_LIMIT", default_value_t = 1024 * 1024)]
    pub request_body_limit: usize,
}

/// Validated backend coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    pub url: String,
    pub key: String,
}

impl TryFrom<&BackendArgs> for BackendSettings {
    type Error = ConfigError;

    fn try_from(args: &BackendArgs) -> Result<Self, Self::Error> {
        let url = required(args.backend_url.as_deref(), "BACKEND_URL")?;
        let key = required(args.backend_key.as_deref(), "BACKEND_KEY")?;
        let parsed = reqwest::Url::parse(&url).map_err(|e| ConfigError::Invalid {
            name: "BACKEND_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            return Err(ConfigError::Invalid {
                name: "BACKEND_URL",
                reason: format!("expected an http(s) URL, got {}", url),
            });
        }
        Ok(BackendSettings {
            url: url.trim_end_matches('/').to_string(),
            key,
        })
    }
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(url: Option<&str>, key: Option<&str>) -> BackendArgs {
        BackendArgs {
            backend_url: url.map(str::to_string),
            backend_key: key.map(str::to_string),
        }
    }

    #[test]
    fn url_and_key_are_both_required() {
        let err = BackendSettings::try_from(&args(None, Some("k"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BACKEND_URL")));
        let err = BackendSettings::try_from(&args(Some("https://x.example"), Some("  "))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BACKEND_KEY")));
    }

    #[test]
    fn url_must_be_http() {
        let err = BackendSettings::try_from(&args(Some("ftp://x.example"), Some("k"))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BACKEND_URL", .. }));
        assert!(BackendSettings::try_from(&args(Some("not a url"), Some("k"))).is_err());
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let s = BackendSettings::try_from(&args(Some("https://x.example/"), Some("k"))).unwrap();
        assert_eq!(s.url, "https://x.example");
    }
}
