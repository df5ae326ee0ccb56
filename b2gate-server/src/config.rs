// Copyright 2026 B2Gate Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration management for the b2gate server.
//!
//! Everything comes from environment variables, optionally seeded from a
//! `.env` file in the working directory.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use b2gate_api::{DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_STATIC_DIR};
use b2gate_core::{mask_secret, ConfigSource, EnvSource, ResolvedConfig};
use tracing::{debug, info};

/// Default listen host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5001;

/// Default timeout for calls to the object store, in seconds.
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 30;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server settings (bind address, TLS, etc.)
    pub server: ServerConfig,
    /// Object store credentials and target.
    pub storage: ResolvedConfig,
    /// Metrics and monitoring configuration
    pub metrics: MetricsConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5001").
    /// `B2GATE_BIND`, or `HOST` and `PORT`.
    pub bind: String,
    /// Directory with the frontend assets (`B2GATE_STATIC_DIR`).
    pub static_dir: PathBuf,
    /// Maximum upload size in bytes.
    /// Can be set via B2GATE_MAX_UPLOAD_SIZE environment variable (e.g., "1GB", "100MB").
    pub max_upload_size: usize,
    /// Timeout for each call to the object store (`B2GATE_STORAGE_TIMEOUT_SECS`).
    pub storage_timeout: Duration,
    /// TLS configuration for HTTPS support.
    pub tls: TlsConfig,
}

/// TLS/HTTPS configuration.
///
/// TLS is disabled by default. To enable TLS, set the `B2GATE_TLS_CERT` and
/// `B2GATE_TLS_KEY` environment variables to point to PEM-encoded certificate
/// and private key files. Setting only one of them is a configuration error.
///
/// Example:
/// ```bash
/// export B2GATE_TLS_CERT=/path/to/cert.pem
/// export B2GATE_TLS_KEY=/path/to/key.pem
/// ./b2gate-server
/// ```
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Whether TLS is enabled.
    /// Set when either cert_path or key_path is provided; `validate` then
    /// requires the other.
    pub enabled: bool,
    /// Path to PEM-encoded certificate file.
    pub cert_path: Option<PathBuf>,
    /// Path to PEM-encoded private key file.
    pub key_path: Option<PathBuf>,
}

impl TlsConfig {
    /// Reads `B2GATE_TLS_CERT` and `B2GATE_TLS_KEY`.
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let cert_path = read(source, "B2GATE_TLS_CERT").map(PathBuf::from);
        let key_path = read(source, "B2GATE_TLS_KEY").map(PathBuf::from);

        // Either path asks for TLS; a missing partner is caught by validate()
        let enabled = cert_path.is_some() || key_path.is_some();

        Self {
            enabled,
            cert_path,
            key_path,
        }
    }

    /// Validates TLS configuration.
    ///
    /// Returns an error if TLS is enabled but certificate or key paths are missing.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.cert_path.is_none() {
                return Err("TLS enabled but B2GATE_TLS_CERT is not set".to_string());
            }
            if self.key_path.is_none() {
                return Err("TLS enabled but B2GATE_TLS_KEY is not set".to_string());
            }
        }
        Ok(())
    }
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Enable the Prometheus recorder and `/metrics` (`B2GATE_METRICS_ENABLED`).
    pub prometheus_enabled: bool,
}

impl Config {
    /// Loads `.env` (if present) and then the configuration from the environment.
    ///
    /// Fails when required storage settings are missing.
    pub fn load() -> anyhow::Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(e).context("Failed to read .env file"),
        }

        for line in describe_b2_environment(utf8_vars(std::env::vars_os())) {
            info!("{}", line);
        }

        Self::from_source(&EnvSource)
    }

    /// Builds the configuration from an arbitrary source.
    pub fn from_source(source: &dyn ConfigSource) -> anyhow::Result<Self> {
        let storage = ResolvedConfig::resolve(source).context("Invalid storage configuration")?;

        let bind = match read(source, "B2GATE_BIND") {
            Some(bind) => bind,
            None => {
                let host = read(source, "HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
                let port = match read(source, "PORT") {
                    Some(port) => port
                        .parse::<u16>()
                        .with_context(|| format!("Invalid PORT: {}", port))?,
                    None => DEFAULT_PORT,
                };
                format!("{}:{}", host, port)
            }
        };

        let max_upload_size = match read(source, "B2GATE_MAX_UPLOAD_SIZE") {
            Some(size) => parse_size(&size)
                .map_err(|e| anyhow::anyhow!("Invalid B2GATE_MAX_UPLOAD_SIZE: {}", e))?,
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };

        let timeout_secs = match read(source, "B2GATE_STORAGE_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .with_context(|| format!("Invalid B2GATE_STORAGE_TIMEOUT_SECS: {}", secs))?,
            None => DEFAULT_STORAGE_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("B2GATE_STORAGE_TIMEOUT_SECS must be greater than zero");
        }

        let tls = TlsConfig::from_source(source);
        tls.validate()
            .map_err(|e| anyhow::anyhow!("TLS configuration error: {}", e))?;

        Ok(Self {
            server: ServerConfig {
                bind,
                static_dir: read(source, "B2GATE_STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
                max_upload_size,
                storage_timeout: Duration::from_secs(timeout_secs),
                tls,
            },
            storage,
            metrics: MetricsConfig {
                prometheus_enabled: read(source, "B2GATE_METRICS_ENABLED")
                    .map(|s| parse_bool(&s))
                    .unwrap_or(true),
            },
        })
    }
}

/// Environment entries whose name and value are both valid UTF-8.
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
}

/// One line per `B2_*` variable, sorted by name. Values of variables whose
/// name contains `KEY` are masked.
pub fn describe_b2_environment(vars: impl IntoIterator<Item = (String, String)>) -> Vec<String> {
    let mut entries: Vec<(String, String)> =
        vars.into_iter().filter(|(name, _)| name.starts_with("B2_")).collect();
    entries.sort();

    entries
        .into_iter()
        .map(|(name, value)| {
            let shown = if name.contains("KEY") {
                mask_secret(value.trim())
            } else {
                value
            };
            format!("{} = {}", name, shown)
        })
        .collect()
}

/// Parses a size string like "10GB", "100MB", "1024KB", "5000" into bytes.
///
/// Supported suffixes (case-insensitive):
/// - GB, G: Gigabytes
/// - MB, M: Megabytes
/// - KB, K: Kilobytes
/// - B or no suffix: Bytes
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim().to_uppercase();

    if s.is_empty() {
        return Err("Empty size string".to_string());
    }

    // Find where the numeric part ends
    let num_end = s.chars().position(|c| !c.is_ascii_digit() && c != '.').unwrap_or(s.len());

    let (num_str, suffix) = s.split_at(num_end);
    let suffix = suffix.trim();

    let num: f64 = num_str.parse().map_err(|_| format!("Invalid number: {}", num_str))?;

    let multiplier: usize = match suffix {
        "GB" | "G" => 1024 * 1024 * 1024,
        "MB" | "M" => 1024 * 1024,
        "KB" | "K" => 1024,
        "B" | "" => 1,
        _ => return Err(format!("Unknown size suffix: {}", suffix)),
    };

    Ok((num * multiplier as f64) as usize)
}

fn parse_bool(s: &str) -> bool {
    let s = s.trim().to_lowercase();
    s == "true" || s == "1" || s == "yes"
}

/// Trimmed, non-empty value of `key`.
fn read(source: &dyn ConfigSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("B2_APPLICATION_KEY_ID", "0050428f1a906270000000001"),
            ("B2_APPLICATION_KEY", "K005rH1B5kjFA6QgKtyAbzl1F80qMeY"),
            ("B2_ENDPOINT_URL", "s3.us-west-004.backblazeb2.com"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    #[test]
    fn test_parse_size_bytes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_size_kb() {
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("10kb").unwrap(), 10 * 1024);
    }

    #[test]
    fn test_parse_size_mb() {
        assert_eq!(parse_size("1MB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("100mb").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("1.5M").unwrap(), 1536 * 1024);
    }

    #[test]
    fn test_parse_size_gb() {
        assert_eq!(parse_size("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("2g").unwrap(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("1TB").is_err()); // TB not supported
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_source(&source(&[])).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:5001");
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.server.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
        assert_eq!(config.server.storage_timeout, Duration::from_secs(30));
        assert!(!config.server.tls.enabled);
        assert!(config.metrics.prometheus_enabled);
        assert_eq!(config.storage.bucket_name, "mybucket");
    }

    #[test]
    fn test_host_and_port() {
        let config =
            Config::from_source(&source(&[("HOST", "0.0.0.0"), ("PORT", "8080")])).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");

        let config = Config::from_source(&source(&[
            ("HOST", "0.0.0.0"),
            ("B2GATE_BIND", "[::1]:9000"),
        ]))
        .unwrap();
        assert_eq!(config.server.bind, "[::1]:9000");

        assert!(Config::from_source(&source(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_server_overrides() {
        let config = Config::from_source(&source(&[
            ("B2GATE_STATIC_DIR", "/srv/frontend"),
            ("B2GATE_MAX_UPLOAD_SIZE", "1GB"),
            ("B2GATE_STORAGE_TIMEOUT_SECS", "5"),
            ("B2GATE_METRICS_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(config.server.static_dir, PathBuf::from("/srv/frontend"));
        assert_eq!(config.server.max_upload_size, 1024 * 1024 * 1024);
        assert_eq!(config.server.storage_timeout, Duration::from_secs(5));
        assert!(!config.metrics.prometheus_enabled);
    }

    #[test]
    fn test_invalid_server_values() {
        assert!(Config::from_source(&source(&[("B2GATE_MAX_UPLOAD_SIZE", "lots")])).is_err());
        assert!(Config::from_source(&source(&[("B2GATE_STORAGE_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_missing_storage_setting_is_fatal() {
        let mut src = source(&[]);
        src.remove("B2_ENDPOINT_URL");
        let err = Config::from_source(&src).unwrap_err();
        assert!(format!("{:#}", err).contains("B2_ENDPOINT_URL"));
    }

    #[test]
    fn test_tls_from_source() {
        let tls = TlsConfig::from_source(&source(&[]));
        assert!(!tls.enabled);
        assert!(tls.validate().is_ok());

        let tls = TlsConfig::from_source(&source(&[
            ("B2GATE_TLS_CERT", "/tls/cert.pem"),
            ("B2GATE_TLS_KEY", "/tls/key.pem"),
        ]));
        assert!(tls.enabled);
        assert_eq!(tls.cert_path, Some(PathBuf::from("/tls/cert.pem")));
        assert!(tls.validate().is_ok());
    }

    #[test]
    fn test_tls_cert_without_key_is_rejected() {
        let tls = TlsConfig::from_source(&source(&[("B2GATE_TLS_CERT", "/tls/cert.pem")]));
        assert!(tls.enabled);
        assert_eq!(
            tls.validate().unwrap_err(),
            "TLS enabled but B2GATE_TLS_KEY is not set"
        );

        let err = Config::from_source(&source(&[("B2GATE_TLS_CERT", "/tls/cert.pem")]))
            .unwrap_err();
        assert!(err.to_string().contains("B2GATE_TLS_KEY"));
    }

    #[test]
    fn test_tls_key_without_cert_is_rejected() {
        let err = Config::from_source(&source(&[("B2GATE_TLS_KEY", "/tls/key.pem")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "TLS configuration error: TLS enabled but B2GATE_TLS_CERT is not set"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("B2_BUCKET_NAME"), OsString::from("photos")),
            (OsString::from("B2_REGION"), OsString::from_vec(vec![0x66, 0xff])),
            (OsString::from_vec(vec![b'B', b'2', b'_', 0xfe]), OsString::from("x")),
        ];
        let lines = describe_b2_environment(utf8_vars(vars));
        assert_eq!(lines, vec!["B2_BUCKET_NAME = photos".to_string()]);
    }

    #[test]
    fn test_describe_b2_environment() {
        let vars = vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("B2_BUCKET_NAME".to_string(), "photos".to_string()),
            ("B2_APPLICATION_KEY".to_string(), "K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string()),
            ("B2_KEY_ID".to_string(), "0050428f1a906270000000001".to_string()),
        ];
        let lines = describe_b2_environment(vars);
        assert_eq!(
            lines,
            vec![
                "B2_APPLICATION_KEY = K005r*****0qMeY".to_string(),
                "B2_BUCKET_NAME = photos".to_string(),
                "B2_KEY_ID = 00504*****00001".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" 1 "));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }
}
