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

//! Storage configuration resolution.
//!
//! Each logical setting accepts several historically used variable names.
//! The aliases are probed in order and the first non-empty value wins:
//!
//! | Field | Aliases |
//! |---|---|
//! | access key id | `B2_APPLICATION_KEY_ID`, `B2_KEY_ID`, `B2_ACCESS_KEY_ID` |
//! | secret key | `B2_APPLICATION_KEY`, `B2_SECRET_KEY`, `B2_APPLICATION_SECRET` |
//! | endpoint | `B2_ENDPOINT_URL` |
//! | bucket | `B2_BUCKET_NAME` (default `mybucket`) |
//! | region | `B2_REGION` (default derived from the endpoint host) |
//! | expected key id | `B2_EXPECTED_KEY_ID` (optional, diagnostics only) |

use std::collections::HashMap;
use std::fmt;

use url::Url;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::mask::{key_id_preview, mask_secret};

/// Bucket used when no bucket alias is set.
pub const DEFAULT_BUCKET: &str = "mybucket";

/// Region placeholder when neither configured nor derivable from the endpoint.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Keys shorter than this are reported as suspicious (never rejected).
pub const MIN_KEY_LENGTH: usize = 20;

/// A key-value configuration source.
pub trait ConfigSource {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// A logical configuration field and its ordered aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Human-readable field name.
    pub name: &'static str,
    /// Accepted variable names, highest precedence first.
    pub aliases: &'static [&'static str],
    /// Whether values must be masked when displayed.
    pub secret: bool,
}

impl Field {
    /// Access key id (B2 "keyID").
    pub const ACCESS_KEY_ID: Field = Field {
        name: "access key id",
        aliases: &["B2_APPLICATION_KEY_ID", "B2_KEY_ID", "B2_ACCESS_KEY_ID"],
        secret: true,
    };

    /// Secret key (B2 "applicationKey").
    pub const SECRET_KEY: Field = Field {
        name: "secret key",
        aliases: &["B2_APPLICATION_KEY", "B2_SECRET_KEY", "B2_APPLICATION_SECRET"],
        secret: true,
    };

    /// S3-compatible endpoint.
    pub const ENDPOINT: Field = Field {
        name: "endpoint",
        aliases: &["B2_ENDPOINT_URL"],
        secret: false,
    };

    /// Target bucket.
    pub const BUCKET: Field = Field {
        name: "bucket",
        aliases: &["B2_BUCKET_NAME"],
        secret: false,
    };

    /// Signing region override.
    pub const REGION: Field = Field {
        name: "region",
        aliases: &["B2_REGION"],
        secret: false,
    };

    /// Key id the operator expects to be in use.
    pub const EXPECTED_KEY_ID: Field = Field {
        name: "expected key id",
        aliases: &["B2_EXPECTED_KEY_ID"],
        secret: true,
    };

    /// Every known field, in resolution order.
    pub const ALL: [Field; 6] = [
        Field::ACCESS_KEY_ID,
        Field::SECRET_KEY,
        Field::ENDPOINT,
        Field::BUCKET,
        Field::REGION,
        Field::EXPECTED_KEY_ID,
    ];

    /// The variable name reported when the field is missing.
    pub fn primary(&self) -> &'static str {
        self.aliases[0]
    }

    /// Returns the first alias with a non-empty cleaned value.
    pub fn lookup(&self, source: &dyn ConfigSource) -> Option<(&'static str, String)> {
        self.aliases.iter().find_map(|alias| {
            source.get(alias).and_then(|raw| clean_value(&raw)).map(|value| (*alias, value))
        })
    }

    /// Like [`Field::lookup`] but missing values are a configuration error.
    pub fn require(&self, source: &dyn ConfigSource) -> Result<(&'static str, String), ConfigError> {
        self.lookup(source).ok_or_else(|| ConfigError::MissingField {
            field: self.name,
            variable: self.primary(),
            aliases: self.aliases.join(", "),
        })
    }
}

/// Strips surrounding whitespace and one matched pair of quotes.
///
/// Text inside the quotes is kept as written. Returns `None` when nothing is left.
pub fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|quote| trimmed.strip_prefix(*quote).and_then(|s| s.strip_suffix(*quote)))
        .unwrap_or(trimmed);

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

/// Ensures the endpoint carries an explicit scheme, defaulting to HTTPS.
pub fn normalize_endpoint(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}

/// Extracts `<region>` from hosts shaped like `s3.<region>.backblazeb2.com`.
pub fn region_from_host(host: &str) -> Option<String> {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 3 && labels[0].eq_ignore_ascii_case("s3") && !labels[1].is_empty() {
        Some(labels[1].to_string())
    } else {
        None
    }
}

/// Parses a normalized endpoint, requiring a host.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Storage configuration, resolved once at startup and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Access key id used for signing.
    pub access_key_id: String,
    /// Secret key used for signing.
    pub secret_key: String,
    /// Endpoint with an explicit `http://` or `https://` scheme.
    pub endpoint_url: String,
    /// Target bucket.
    pub bucket_name: String,
    /// Signing region.
    pub region: String,
    /// Key id the operator expects, for diagnostics.
    pub expected_key_id: Option<String>,
}

impl ResolvedConfig {
    /// Resolves and validates the configuration from `source`.
    pub fn resolve(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let (key_alias, access_key_id) = Field::ACCESS_KEY_ID.require(source)?;
        let (secret_alias, secret_key) = Field::SECRET_KEY.require(source)?;
        let (_, raw_endpoint) = Field::ENDPOINT.require(source)?;

        let endpoint_url = normalize_endpoint(&raw_endpoint);
        let endpoint = parse_endpoint(&endpoint_url)?;

        let bucket_name = Field::BUCKET
            .lookup(source)
            .map(|(_, value)| value)
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        let region = Field::REGION
            .lookup(source)
            .map(|(_, value)| value)
            .or_else(|| endpoint.host_str().and_then(region_from_host))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let expected_key_id = Field::EXPECTED_KEY_ID.lookup(source).map(|(_, value)| value);

        let config = Self {
            access_key_id,
            secret_key,
            endpoint_url,
            bucket_name,
            region,
            expected_key_id,
        };

        info!(
            "Loaded {}: {} (length: {})",
            key_alias,
            mask_secret(&config.access_key_id),
            config.access_key_id.chars().count()
        );
        info!(
            "Loaded {}: {} (length: {})",
            secret_alias,
            mask_secret(&config.secret_key),
            config.secret_key.chars().count()
        );
        info!("Endpoint: {}", config.endpoint_url);
        info!("Bucket: {}", config.bucket_name);
        info!("Signing region: {}", config.region);

        for warning in config.key_warnings() {
            warn!("{}", warning);
        }

        if let Some(matches) = config.key_id_matches_expected() {
            if matches {
                info!("Key id matches B2_EXPECTED_KEY_ID");
            } else {
                warn!("Key id does NOT match B2_EXPECTED_KEY_ID; a different key may be in use");
            }
        }

        Ok(config)
    }

    /// Heuristic warnings about key lengths. Key formats vary by provider,
    /// so these never fail resolution.
    pub fn key_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let key_id_len = self.access_key_id.chars().count();
        if key_id_len < MIN_KEY_LENGTH {
            warnings.push(format!(
                "Access key id seems too short ({} chars); S3-compatible application key ids are usually 20-25 characters",
                key_id_len
            ));
        }
        let secret_len = self.secret_key.chars().count();
        if secret_len < MIN_KEY_LENGTH {
            warnings.push(format!(
                "Secret key seems too short ({} chars); expected 30 or more characters",
                secret_len
            ));
        }
        warnings
    }

    /// Compares the key id with `B2_EXPECTED_KEY_ID`, if one was configured.
    pub fn key_id_matches_expected(&self) -> Option<bool> {
        self.expected_key_id.as_ref().map(|expected| *expected == self.access_key_id)
    }

    /// Non-sensitive context attached to storage failures.
    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            key_id_length: self.access_key_id.chars().count(),
            key_id_preview: key_id_preview(&self.access_key_id),
            endpoint: self.endpoint_url.clone(),
            bucket: self.bucket_name.clone(),
        }
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("access_key_id", &mask_secret(&self.access_key_id))
            .field("secret_key", &mask_secret(&self.secret_key))
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("expected_key_id", &self.expected_key_id.as_deref().map(mask_secret))
            .finish()
    }
}

/// Operator-facing context for storage failures. Contains no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    /// Length of the access key id.
    pub key_id_length: usize,
    /// Masked access key id.
    pub key_id_preview: String,
    /// Endpoint in use.
    pub endpoint: String,
    /// Bucket in use.
    pub bucket: String,
}
