//! Runtime configuration read from the environment (after `.env` is loaded).
//!
//! | Variable            | Default          |
//! |---------------------|------------------|
//! | `SUPABASE_URL`      | unset (in-memory backends) |
//! | `SUPABASE_KEY`      | unset            |
//! | `BIND_ADDR`         | `127.0.0.1:5000` |
//! | `STRICT_UPLOADS`    | `false`          |
//! | `MAX_UPLOAD_BYTES`  | 5 MiB            |
//! | `HTTP_TIMEOUT_SECS` | `30`             |

use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::parser::ParseMode;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Location and credentials of the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub key: String,
    /// Applied to every outbound request.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs against in-memory backends.
    pub backend: Option<BackendConfig>,
    pub bind_addr: SocketAddr,
    pub parse_mode: ParseMode,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            parse_mode: ParseMode::Lenient,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn parse_var<T>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{name} has an invalid value '{raw}'")),
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => bail!("{name} must be a boolean, got '{other}'"),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timeout = Duration::from_secs(parse_var(
            "HTTP_TIMEOUT_SECS",
            lookup("HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?);
        if timeout.is_zero() {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        let url = lookup("SUPABASE_URL").filter(|v| !v.trim().is_empty());
        let key = lookup("SUPABASE_KEY").filter(|v| !v.trim().is_empty());
        let backend = match (url, key) {
            (Some(url), Some(key)) => Some(BackendConfig {
                url: url.trim().to_string(),
                key: key.trim().to_string(),
                timeout,
            }),
            (None, None) => None,
            (Some(_), None) => bail!("SUPABASE_URL is set but SUPABASE_KEY is missing"),
            (None, Some(_)) => bail!("SUPABASE_KEY is set but SUPABASE_URL is missing"),
        };

        let bind_addr = parse_var(
            "BIND_ADDR",
            lookup("BIND_ADDR"),
            SocketAddr::from_str(DEFAULT_BIND_ADDR)?,
        )?;

        let parse_mode = if parse_flag("STRICT_UPLOADS", lookup("STRICT_UPLOADS"))? {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        };

        let max_upload_bytes = parse_var(
            "MAX_UPLOAD_BYTES",
            lookup("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        Ok(Self {
            backend,
            bind_addr,
            parse_mode,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.backend.is_none());
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.parse_mode, ParseMode::Lenient);
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_backend_and_overrides() {
        let cfg = config(&[
            ("SUPABASE_URL", "https://proj.example.co"),
            ("SUPABASE_KEY", "k"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("STRICT_UPLOADS", "Yes"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ])
        .unwrap();
        let backend = cfg.backend.unwrap();
        assert_eq!(backend.url, "https://proj.example.co");
        assert_eq!(backend.timeout, Duration::from_secs(5));
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.parse_mode, ParseMode::Strict);
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn test_half_configured_backend_is_rejected() {
        assert!(config(&[("SUPABASE_URL", "https://x")]).is_err());
        assert!(config(&[("SUPABASE_KEY", "k")]).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("STRICT_UPLOADS", "maybe")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "lots")]).is_err());
        assert!(config(&[("HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(config(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
