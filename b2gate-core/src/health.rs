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

//! Configuration health report.
//!
//! Summarizes the resolved configuration and probes the bucket once.
//! Secrets appear only as presence flags, lengths and masked previews.

use serde::Serialize;
use tracing::warn;

use crate::config::ResolvedConfig;
use crate::mask::mask_secret;
use crate::store::ObjectStore;

/// Remediation hint attached to permission failures.
pub const PERMISSION_FIX_HINT: &str = "The application key needs read and write permission on this bucket. \
     Create a key scoped to the bucket (or with access to all buckets) and restart the server.";

/// Result of [`check_config`], serialized as the `/api/check-config` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReport {
    /// `Set` or `Missing`.
    #[serde(rename = "B2_APPLICATION_KEY_ID")]
    pub key_id_status: &'static str,
    /// `Set` or `Missing`.
    #[serde(rename = "B2_APPLICATION_KEY")]
    pub key_status: &'static str,
    /// Endpoint, or `Missing`.
    #[serde(rename = "B2_ENDPOINT_URL")]
    pub endpoint: String,
    /// Bucket, or `Missing`.
    #[serde(rename = "B2_BUCKET_NAME")]
    pub bucket: String,
    pub key_id_length: usize,
    pub key_length: usize,
    /// Masked key id.
    pub key_id_preview: String,
    pub endpoint_preview: String,
    pub region: String,
    /// `Success` or `Failed: <message>`.
    pub connection_test: String,
    /// `Authorized` or `Unauthorized`.
    pub bucket_access: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_required: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_verification: Option<KeyVerification>,
}

/// Why the bucket probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub error_type: String,
    pub error_message: String,
}

/// Which key is in use, attached to permission failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyVerification {
    pub actual_key_id_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_key_id_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id_matches: Option<bool>,
}

/// Builds the configuration report, probing the bucket with one HEAD request.
///
/// Never fails: probe errors are reported inside the result.
pub async fn check_config(config: &ResolvedConfig, store: &dyn ObjectStore) -> ConfigReport {
    let mut report = ConfigReport {
        key_id_status: presence(&config.access_key_id),
        key_status: presence(&config.secret_key),
        endpoint: value_or_missing(&config.endpoint_url),
        bucket: value_or_missing(&config.bucket_name),
        key_id_length: config.access_key_id.chars().count(),
        key_length: config.secret_key.chars().count(),
        key_id_preview: mask_secret(&config.access_key_id),
        endpoint_preview: config.endpoint_url.clone(),
        region: config.region.clone(),
        connection_test: "Success".to_string(),
        bucket_access: "Authorized",
        error_details: None,
        fix_required: None,
        key_verification: None,
    };

    if let Err(err) = store.head_bucket(&config.bucket_name).await {
        let message = err.to_string();
        warn!("Bucket probe for '{}' failed: {}", config.bucket_name, message);

        report.connection_test = format!("Failed: {}", message);
        report.bucket_access = "Unauthorized";
        report.error_details = Some(ErrorDetails {
            error_type: err.error_type().to_string(),
            error_message: message,
        });

        if err.is_permission_error() {
            report.fix_required = Some(PERMISSION_FIX_HINT.to_string());
            report.key_verification = Some(KeyVerification {
                actual_key_id_preview: mask_secret(&config.access_key_id),
                expected_key_id_preview: config.expected_key_id.as_deref().map(mask_secret),
                key_id_matches: config.key_id_matches_expected(),
            });
        }
    }

    report
}

fn presence(value: &str) -> &'static str {
    if value.is_empty() {
        "Missing"
    } else {
        "Set"
    }
}

fn value_or_missing(value: &str) -> String {
    if value.is_empty() {
        "Missing".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SigningError, StorageError};
    use crate::store::{ChunkSource, PresignRequest};
    use crate::types::ObjectListing;
    use async_trait::async_trait;

    const KEY_ID: &str = "0050428f1a906270000000001";
    const SECRET: &str = "K005rH1B5kjFA6QgKtyAbzl1F80qMeY";

    struct HeadOnlyStore(Option<StorageError>);

    #[async_trait]
    impl ObjectStore for HeadOnlyStore {
        async fn presign(&self, request: &PresignRequest) -> Result<String, SigningError> {
            Err(SigningError::new(request.operation.as_str(), "unused"))
        }

        async fn list_objects(&self, _bucket: &str) -> Result<ObjectListing, StorageError> {
            Ok(ObjectListing::default())
        }

        async fn head_bucket(&self, _bucket: &str) -> Result<(), StorageError> {
            match &self.0 {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        async fn put_object(
            &self,
            _bucket: &str,
            _key: &str,
            _body: &mut dyn ChunkSource,
            _content_type: &str,
        ) -> Result<u64, StorageError> {
            Ok(0)
        }
    }

    fn config(expected_key_id: Option<&str>) -> ResolvedConfig {
        ResolvedConfig {
            access_key_id: KEY_ID.to_string(),
            secret_key: SECRET.to_string(),
            endpoint_url: "https://s3.us-west-004.backblazeb2.com".to_string(),
            bucket_name: "mybucket".to_string(),
            region: "us-west-004".to_string(),
            expected_key_id: expected_key_id.map(str::to_string),
        }
    }

    fn unauthorized() -> StorageError {
        StorageError::Service {
            status: 401,
            code: "UnauthorizedAccess".to_string(),
            message: "bucket is not authorized: mybucket".to_string(),
        }
    }

    #[tokio::test]
    async fn test_healthy_report() {
        let report = check_config(&config(None), &HeadOnlyStore(None)).await;

        assert_eq!(report.key_id_status, "Set");
        assert_eq!(report.key_status, "Set");
        assert_eq!(report.key_id_length, 25);
        assert_eq!(report.key_length, 31);
        assert_eq!(report.key_id_preview, "00504*****00001");
        assert_eq!(report.connection_test, "Success");
        assert_eq!(report.bucket_access, "Authorized");
        assert!(report.error_details.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["B2_APPLICATION_KEY_ID"], "Set");
        assert_eq!(json["B2_BUCKET_NAME"], "mybucket");
        assert!(json.get("fix_required").is_none());
        assert!(json.get("key_verification").is_none());
    }

    #[tokio::test]
    async fn test_permission_failure_adds_hint() {
        let report =
            check_config(&config(Some("0050000000000000000000009")), &HeadOnlyStore(Some(unauthorized())))
                .await;

        assert!(report.connection_test.starts_with("Failed: UnauthorizedAccess"));
        assert_eq!(report.bucket_access, "Unauthorized");
        assert_eq!(
            report.error_details.as_ref().map(|d| d.error_type.as_str()),
            Some("UnauthorizedAccess")
        );
        assert_eq!(report.fix_required.as_deref(), Some(PERMISSION_FIX_HINT));

        let verification = report.key_verification.unwrap();
        assert_eq!(verification.actual_key_id_preview, "00504*****00001");
        assert_eq!(verification.expected_key_id_preview.as_deref(), Some("00500*****00009"));
        assert_eq!(verification.key_id_matches, Some(false));
    }

    #[tokio::test]
    async fn test_other_failure_has_no_hint() {
        let err = StorageError::Transport("connection refused".to_string());
        let report = check_config(&config(None), &HeadOnlyStore(Some(err))).await;

        assert_eq!(report.connection_test, "Failed: Transport error: connection refused");
        assert!(report.fix_required.is_none());
        assert!(report.key_verification.is_none());
    }

    #[tokio::test]
    async fn test_report_never_contains_secret() {
        let report = check_config(&config(Some(KEY_ID)), &HeadOnlyStore(Some(unauthorized()))).await;
        let json = serde_json::to_string(&report).unwrap();

        assert!(!json.contains(SECRET));
        assert!(!json.contains(KEY_ID));
    }
}
