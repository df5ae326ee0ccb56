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

//! Pre-signed URL issuance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::{IssueError, ValidationError};
use crate::store::{ObjectStore, PresignRequest, MAX_PRESIGN_EXPIRY_SECS};
use crate::types::{SignedUrl, SignedUrlRequest, UrlOperation};

/// Lifetime used when the request does not specify one.
pub const DEFAULT_EXPIRATION_SECS: u64 = 3600;

/// Issues pre-signed URLs for objects in one bucket.
#[derive(Clone)]
pub struct UrlIssuer {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl UrlIssuer {
    /// Creates an issuer for `bucket`.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Bucket the URLs point into.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Issues a URL valid from now.
    pub async fn issue(
        &self,
        operation: UrlOperation,
        request: &SignedUrlRequest,
    ) -> Result<SignedUrl, IssueError> {
        self.issue_at(operation, request, Utc::now()).await
    }

    /// Issues a URL as of `now`.
    ///
    /// Input is validated before the store is consulted, and the store's
    /// signer is called exactly once. Its URL is returned untouched.
    pub async fn issue_at(
        &self,
        operation: UrlOperation,
        request: &SignedUrlRequest,
        now: DateTime<Utc>,
    ) -> Result<SignedUrl, IssueError> {
        let file_name = validate_file_name(request.file_name.as_deref())?;
        let expiration = validate_expiration(request.expiration)?;

        let url = self
            .store
            .presign(&PresignRequest {
                operation,
                bucket: self.bucket.clone(),
                key: file_name.to_string(),
                expires_in_secs: expiration,
                signed_at: now,
            })
            .await
            .map_err(|e| {
                error!("{}", e);
                e
            })?;

        metrics::counter!("presigned_urls_issued_total", "operation" => operation.as_str())
            .increment(1);
        info!(
            "Issued {} URL for {}/{} (expires in {}s)",
            operation.as_str(),
            self.bucket,
            file_name,
            expiration
        );

        Ok(SignedUrl {
            url,
            file_name: file_name.to_string(),
            expiration_seconds: expiration,
            expires_at: now.timestamp_millis() as f64 / 1000.0 + expiration as f64,
        })
    }
}

fn validate_file_name(file_name: Option<&str>) -> Result<&str, ValidationError> {
    match file_name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(ValidationError("file_name is required".to_string())),
    }
}

fn validate_expiration(expiration: Option<i64>) -> Result<u64, ValidationError> {
    let Some(seconds) = expiration else {
        return Ok(DEFAULT_EXPIRATION_SECS);
    };
    if seconds <= 0 || seconds as u64 > MAX_PRESIGN_EXPIRY_SECS {
        return Err(ValidationError(format!(
            "expiration must be between 1 and {} seconds",
            MAX_PRESIGN_EXPIRY_SECS
        )));
    }
    Ok(seconds as u64)
}
