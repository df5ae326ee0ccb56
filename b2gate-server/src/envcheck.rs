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

//! Offline report of which storage variables are set and which would win.

use b2gate_core::{config::clean_value, mask_secret, ConfigSource, Field, ResolvedConfig};

/// Fields without which the server refuses to start.
const REQUIRED: [Field; 3] = [Field::ACCESS_KEY_ID, Field::SECRET_KEY, Field::ENDPOINT];

/// Result of [`check_environment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReport {
    /// Human-readable report, one entry per line.
    pub lines: Vec<String>,
    /// False when resolution would fail.
    pub ok: bool,
}

/// Inspects every known alias in `source` without contacting the store.
pub fn check_environment(source: &dyn ConfigSource) -> EnvReport {
    let mut lines = Vec::new();

    for field in Field::ALL {
        lines.push(format!("[{}]", field.name));
        for alias in field.aliases {
            lines.push(format!("  {}: {}", alias, describe_alias(source, alias, field.secret)));
        }
        let outcome = match field.lookup(source) {
            Some((alias, _)) => format!("  -> using {}", alias),
            None if REQUIRED.contains(&field) => "  -> MISSING (required)".to_string(),
            None => "  -> not set, default applies".to_string(),
        };
        lines.push(outcome);
    }

    lines.push(String::new());
    let ok = match ResolvedConfig::resolve(source) {
        Ok(config) => {
            lines.push("Resolved configuration:".to_string());
            lines.push(format!("  endpoint: {}", config.endpoint_url));
            lines.push(format!("  bucket: {}", config.bucket_name));
            lines.push(format!("  region: {}", config.region));
            lines.push(format!("  key id: {}", mask_secret(&config.access_key_id)));
            for warning in config.key_warnings() {
                lines.push(format!("  warning: {}", warning));
            }
            match config.key_id_matches_expected() {
                Some(true) => lines.push("  key id matches B2_EXPECTED_KEY_ID".to_string()),
                Some(false) => {
                    lines.push("  warning: key id does not match B2_EXPECTED_KEY_ID".to_string())
                }
                None => {}
            }
            true
        }
        Err(e) => {
            lines.push(format!("Configuration error: {}", e));
            false
        }
    };

    EnvReport { lines, ok }
}

fn describe_alias(source: &dyn ConfigSource, alias: &str, secret: bool) -> String {
    let Some(raw) = source.get(alias) else {
        return "not set".to_string();
    };
    match clean_value(&raw) {
        None => "set but empty".to_string(),
        Some(value) => {
            let len = value.chars().count();
            if secret {
                format!("{} ({} chars)", mask_secret(&value), len)
            } else {
                value
            }
        }
    }
}
