use printdesk_common::error::{PrintdeskError, PrintdeskResult};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> PrintdeskResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let mut values = require_vars(&["DATABASE_URL"])?.into_iter();

        Ok(Self {
            database_url: values.next().unwrap_or_default(),
            host: get_var_or("HOST", "0.0.0.0"),
            port: get_var_or("PORT", "8080")
                .parse()
                .map_err(|e| PrintdeskError::Config(format!("invalid PORT: {e}")))?,
            log_level: get_var_or("LOG_LEVEL", "info"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read every key in `keys`, in order.
///
/// Fails with [`PrintdeskError::MissingConfig`] naming *all* keys that are
/// unset or blank, so a misconfigured deployment is fixed in one pass.
pub fn require_vars(keys: &[&str]) -> PrintdeskResult<Vec<String>> {
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();

    for key in keys {
        match env::var(key) {
            Ok(v) if !v.trim().is_empty() => values.push(v),
            _ => missing.push((*key).to_string()),
        }
    }

    if missing.is_empty() {
        Ok(values)
    } else {
        Err(PrintdeskError::MissingConfig(missing))
    }
}

/// Parse an optional tunable, falling back to `default` when unset.
/// A value that is set but unparsable is a configuration error.
pub fn parse_var_or<T>(key: &str, default: T) -> PrintdeskResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| PrintdeskError::Config(format!("invalid {key}: {e}"))),
        _ => Ok(default),
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
