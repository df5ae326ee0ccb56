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

//! S3-compatible object store backed by `aws-sdk-s3`.
//!
//! Uses path-style addressing (`{endpoint}/{bucket}/{key}`), which Backblaze
//! B2 and most self-hosted S3 servers accept. Calls are never retried.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation,
    ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::BytesMut;
use chrono::{TimeZone, Utc};
use tracing::{debug, warn};

use super::{ChunkSource, ObjectStore, PresignRequest, MAX_PRESIGN_EXPIRY_SECS};
use crate::config::{parse_endpoint, ResolvedConfig};
use crate::error::{SigningError, StorageError};
use crate::types::{ObjectListing, ObjectSummary, UrlOperation};

/// Default timeout for calls to the store.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Smallest part S3 accepts for every part but the last (5 MiB).
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Part size used for multipart uploads unless overridden (8 MiB).
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// S3 client bound to one endpoint and credential pair.
///
/// The inner `Client` pools connections and is cheap to clone.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    part_size: usize,
}

impl S3Store {
    /// Creates a store for the resolved configuration.
    ///
    /// `timeout` bounds every call, including each part of a multipart upload.
    pub fn new(config: &ResolvedConfig, timeout: Duration) -> Result<Self, StorageError> {
        let endpoint = parse_endpoint(&config.endpoint_url)
            .map_err(|e| StorageError::Configuration(e.to_string()))?;

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_key,
            None,
            None,
            "b2gate",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .credentials_provider(credentials)
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            // B2 rejects the streaming checksum trailers the SDK sends by default
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            part_size: DEFAULT_PART_SIZE,
        })
    }

    /// Sets the multipart part size, raised to [`MIN_PART_SIZE`] if smaller.
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size.max(MIN_PART_SIZE);
        self
    }

    /// Pulls chunks into `buffer` until it holds a full part.
    ///
    /// Returns true once the source is exhausted.
    async fn fill(
        &self,
        body: &mut dyn ChunkSource,
        buffer: &mut BytesMut,
    ) -> Result<bool, StorageError> {
        while buffer.len() < self.part_size {
            match body.next_chunk().await? {
                Some(chunk) => buffer.extend_from_slice(&chunk),
                None => return Ok(true),
            }
        }
        Ok(false)
    }

    /// Sends a body that fit within one part as a plain `PutObject`.
    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        buffer: BytesMut,
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let size = buffer.len() as u64;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(size as i64)
            .body(ByteStream::from(buffer.freeze()))
            .send()
            .await
            .map_err(storage_error)?;
        Ok(size)
    }

    /// Uploads the buffered data and the rest of `body` as a multipart upload.
    ///
    /// The upload is aborted when any part or the completion fails.
    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        body: &mut dyn ChunkSource,
        buffer: BytesMut,
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(storage_error)?;
        let upload_id = created.upload_id().ok_or_else(|| {
            StorageError::InvalidResponse("CreateMultipartUpload returned no UploadId".to_string())
        })?;

        debug!("Started multipart upload {} for {}/{}", upload_id, bucket, key);

        match self.upload_parts(bucket, key, upload_id, body, buffer).await {
            Ok(size) => Ok(size),
            Err(e) => {
                if let Err(abort) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .send()
                    .await
                {
                    warn!(
                        "Failed to abort multipart upload {} for {}/{}: {}",
                        upload_id,
                        bucket,
                        key,
                        DisplayErrorContext(&abort)
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        body: &mut dyn ChunkSource,
        mut buffer: BytesMut,
    ) -> Result<u64, StorageError> {
        let mut parts = Vec::new();
        let mut total = 0u64;
        let mut exhausted = false;

        loop {
            while buffer.len() >= self.part_size || (exhausted && !buffer.is_empty()) {
                let part = buffer.split_to(buffer.len().min(self.part_size)).freeze();
                let part_number = parts.len() as i32 + 1;
                let size = part.len() as u64;

                let uploaded = self
                    .client
                    .upload_part()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(upload_id)
                    .part_number(part_number)
                    .content_length(size as i64)
                    .body(ByteStream::from(part))
                    .send()
                    .await
                    .map_err(storage_error)?;

                parts.push(
                    CompletedPart::builder()
                        .part_number(part_number)
                        .set_e_tag(uploaded.e_tag().map(str::to_string))
                        .build(),
                );
                total += size;
            }
            if exhausted {
                break;
            }
            exhausted = self.fill(body, &mut buffer).await?;
        }

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(CompletedMultipartUpload::builder().set_parts(Some(parts)).build())
            .send()
            .await
            .map_err(storage_error)?;

        Ok(total)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign(&self, request: &PresignRequest) -> Result<String, SigningError> {
        let operation = request.operation.as_str();
        if request.key.is_empty() {
            return Err(SigningError::new(operation, "object key is empty"));
        }
        if request.expires_in_secs == 0 || request.expires_in_secs > MAX_PRESIGN_EXPIRY_SECS {
            return Err(SigningError::new(
                operation,
                format!(
                    "expiration must be between 1 and {} seconds, got {}",
                    MAX_PRESIGN_EXPIRY_SECS, request.expires_in_secs
                ),
            ));
        }

        let presigning = PresigningConfig::builder()
            .start_time(SystemTime::from(request.signed_at))
            .expires_in(Duration::from_secs(request.expires_in_secs))
            .build()
            .map_err(|e| SigningError::new(operation, e.to_string()))?;

        let presigned = match request.operation {
            UrlOperation::Download => self
                .client
                .get_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .presigned(presigning)
                .await
                .map_err(|e| SigningError::new(operation, DisplayErrorContext(&e).to_string()))?,
            UrlOperation::Upload => self
                .client
                .put_object()
                .bucket(&request.bucket)
                .key(&request.key)
                .presigned(presigning)
                .await
                .map_err(|e| SigningError::new(operation, DisplayErrorContext(&e).to_string()))?,
        };

        Ok(presigned.uri().to_string())
    }

    async fn list_objects(&self, bucket: &str) -> Result<ObjectListing, StorageError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .send()
            .await
            .map_err(storage_error)?;

        let objects: Vec<ObjectSummary> = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    name: object.key()?.to_string(),
                    size_bytes: object.size().unwrap_or_default().max(0) as u64,
                    last_modified: object
                        .last_modified()
                        .and_then(|t| Utc.timestamp_opt(t.secs(), t.subsec_nanos()).single())
                        .unwrap_or_default(),
                })
            })
            .collect();

        let is_truncated = output.is_truncated().unwrap_or(false);
        if is_truncated {
            warn!(
                "Listing of bucket '{}' is truncated; returning the first {} objects only",
                bucket,
                objects.len()
            );
        }

        Ok(ObjectListing {
            objects,
            is_truncated,
        })
    }

    async fn head_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &mut dyn ChunkSource,
        content_type: &str,
    ) -> Result<u64, StorageError> {
        let mut buffer = BytesMut::new();
        let exhausted = self.fill(body, &mut buffer).await?;

        let size = if exhausted {
            self.put_single(bucket, key, buffer, content_type).await?
        } else {
            self.put_multipart(bucket, key, body, buffer, content_type).await?
        };

        debug!("Stored {}/{} ({} bytes, {})", bucket, key, size, content_type);
        Ok(size)
    }
}

/// Maps an SDK failure onto [`StorageError`].
///
/// Error responses without a body (HEAD) fall back to the reason phrase.
fn storage_error<E>(err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(context) => {
            let status = context.raw().status().as_u16();
            let reason = reason_phrase(status);
            StorageError::Service {
                status,
                code: context
                    .err()
                    .code()
                    .map(str::to_string)
                    .unwrap_or_else(|| reason.replace(' ', "")),
                message: context
                    .err()
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| reason.to_string()),
            }
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StorageError::Transport(DisplayErrorContext(&err).to_string())
        }
        SdkError::ConstructionFailure(_) => {
            StorageError::Configuration(DisplayErrorContext(&err).to_string())
        }
        _ => StorageError::InvalidResponse(DisplayErrorContext(&err).to_string()),
    }
}

/// Reason phrase for the statuses an S3 endpoint commonly returns.
fn reason_phrase(status: u16) -> &'static str {
    match status {
        301 => "Moved Permanently",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> ResolvedConfig {
        ResolvedConfig {
            access_key_id: "0050428f1a906270000000001".to_string(),
            secret_key: "K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string(),
            endpoint_url: endpoint.to_string(),
            bucket_name: "mybucket".to_string(),
            region: "us-west-004".to_string(),
            expected_key_id: None,
        }
    }

    fn request(operation: UrlOperation, key: &str, expires_in_secs: u64) -> PresignRequest {
        PresignRequest {
            operation,
            bucket: "mybucket".to_string(),
            key: key.to_string(),
            expires_in_secs,
            signed_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_presign_path_style() {
        let store =
            S3Store::new(&config("https://s3.us-west-004.backblazeb2.com"), DEFAULT_TIMEOUT)
                .unwrap();
        let url = store
            .presign(&request(UrlOperation::Download, "docs/report 1.pdf", 3600))
            .await
            .unwrap();

        assert!(url.starts_with(
            "https://s3.us-west-004.backblazeb2.com/mybucket/docs/report%201.pdf?"
        ));
        assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        assert!(url.contains(
            "X-Amz-Credential=0050428f1a906270000000001%2F20240601%2Fus-west-004%2Fs3%2Faws4_request"
        ));
        assert!(url.contains("X-Amz-Date=20240601T120000Z"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(!url.contains("K005rH1B5kjFA6QgKtyAbzl1F80qMeY"));
    }

    #[tokio::test]
    async fn test_presign_method_changes_signature() {
        let store = S3Store::new(&config("http://localhost:9000"), DEFAULT_TIMEOUT).unwrap();
        let get = store
            .presign(&request(UrlOperation::Download, "a.txt", 60))
            .await
            .unwrap();
        let put = store
            .presign(&request(UrlOperation::Upload, "a.txt", 60))
            .await
            .unwrap();

        assert!(get.starts_with("http://localhost:9000/mybucket/a.txt?"));
        assert!(put.starts_with("http://localhost:9000/mybucket/a.txt?"));
        assert_ne!(get, put);
    }

    #[tokio::test]
    async fn test_presign_rejects_out_of_range_expiry() {
        let store = S3Store::new(&config("http://localhost:9000"), DEFAULT_TIMEOUT).unwrap();

        let err = store
            .presign(&request(UrlOperation::Upload, "a.txt", 0))
            .await
            .unwrap_err();
        assert_eq!(err.operation, "upload");

        let err = store
            .presign(&request(UrlOperation::Download, "a.txt", MAX_PRESIGN_EXPIRY_SECS + 1))
            .await
            .unwrap_err();
        assert_eq!(err.operation, "download");

        assert!(store
            .presign(&request(UrlOperation::Download, "a.txt", MAX_PRESIGN_EXPIRY_SECS))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_presign_rejects_empty_key() {
        let store = S3Store::new(&config("http://localhost:9000"), DEFAULT_TIMEOUT).unwrap();
        assert!(store
            .presign(&request(UrlOperation::Download, "", 60))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_endpoint_base_path_is_kept() {
        let store = S3Store::new(&config("http://localhost:9000/s3/"), DEFAULT_TIMEOUT).unwrap();
        let url = store
            .presign(&request(UrlOperation::Download, "k", 60))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/s3/mybucket/k?"));
    }

    #[test]
    fn test_part_size_has_floor() {
        let store = S3Store::new(&config("http://localhost:9000"), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(store.part_size, DEFAULT_PART_SIZE);
        assert_eq!(store.clone().with_part_size(1024).part_size, MIN_PART_SIZE);
        assert_eq!(store.with_part_size(16 << 20).part_size, 16 << 20);
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(reason_phrase(404).replace(' ', ""), "NotFound");
        assert_eq!(reason_phrase(403), "Forbidden");
        assert_eq!(reason_phrase(418), "Unknown");
    }
}
