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

//! Bucket listing and proxy upload handlers.

use async_trait::async_trait;
use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use b2gate_core::{ChunkSource, ObjectSummary, StorageError};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};

use super::content_type::{infer_from_name, DEFAULT_CONTENT_TYPE};
use crate::error::ApiError;
use crate::server::AppState;

/// Response body for `GET /api/list-files`.
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub success: bool,
    pub files: Vec<ObjectSummary>,
}

/// Response body for `POST /api/upload-file`.
#[derive(Debug, Serialize)]
pub struct UploadFileResponse {
    pub success: bool,
    pub file_name: String,
    pub message: String,
}

/// `GET /api/list-files`
///
/// Returns the first page of the bucket listing. Failures carry the
/// endpoint, bucket and a masked key id preview for diagnosis.
pub async fn list_files(
    State(state): State<AppState>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let bucket = &state.config.bucket_name;
    match state.store.list_objects(bucket).await {
        Ok(listing) => {
            info!("Listed {} objects in bucket '{}'", listing.objects.len(), bucket);
            Ok(Json(ListFilesResponse {
                success: true,
                files: listing.objects,
            }))
        }
        Err(source) => {
            error!(
                "Listing bucket '{}' failed ({}): {}",
                bucket,
                source.error_type(),
                source
            );
            Err(ApiError::StorageDiagnostic {
                source,
                debug_info: state.config.debug_info(),
            })
        }
    }
}

/// Feeds a multipart `file` field to the store one chunk at a time.
///
/// A read failure is kept so the handler can answer with the multipart
/// error (400 or 413) instead of a storage error.
struct FieldSource<'a> {
    field: Field<'a>,
    failure: Option<MultipartError>,
}

impl<'a> FieldSource<'a> {
    fn new(field: Field<'a>) -> Self {
        Self {
            field,
            failure: None,
        }
    }
}

#[async_trait]
impl<'a> ChunkSource for FieldSource<'a> {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StorageError> {
        match self.field.chunk().await {
            Ok(chunk) => Ok(chunk),
            Err(e) => {
                let message = e.body_text();
                self.failure = Some(e);
                Err(StorageError::Source(message))
            }
        }
    }
}

/// `POST /api/upload-file`
///
/// Multipart fields: `file` (required) and `file_name` (optional, defaults
/// to the uploaded file's name). `file_name` only applies when it arrives
/// before `file`. The file is streamed to the store as it is read, bounded
/// by the body limit.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadFileResponse>, ApiError> {
    let bucket = &state.config.bucket_name;
    let mut requested_name: Option<String> = None;
    let mut stored: Option<(String, u64, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file_name") if stored.is_some() => {
                warn!("Ignoring file_name sent after the file");
            }
            Some("file_name") => {
                requested_name = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") if stored.is_some() => {
                warn!("Ignoring additional file field in upload request");
            }
            Some("file") => {
                let file_name = non_empty(requested_name.take())
                    .or_else(|| non_empty(field.file_name().map(str::to_string)))
                    .ok_or_else(|| ApiError::Validation("file_name is required".to_string()))?;
                let content_type = resolve_content_type(field.content_type(), &file_name);

                let mut source = FieldSource::new(field);
                let result = state
                    .store
                    .put_object(bucket, &file_name, &mut source, &content_type)
                    .await;

                if let Some(failure) = source.failure.take() {
                    error!("Reading upload of '{}' failed: {}", file_name, failure);
                    return Err(multipart_error(failure));
                }
                let size = result.map_err(|e| {
                    error!("Proxy upload of '{}' failed: {}", file_name, e);
                    ApiError::from(e)
                })?;
                stored = Some((file_name, size, content_type));
            }
            _ => {}
        }
    }

    let (file_name, size, content_type) =
        stored.ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;

    info!(
        "Uploaded '{}' ({} bytes, {}) to bucket '{}'",
        file_name, size, content_type, bucket
    );

    Ok(Json(UploadFileResponse {
        success: true,
        file_name,
        message: "File uploaded successfully".to_string(),
    }))
}

/// Content type from the part header, else from the extension, else binary.
pub fn resolve_content_type(declared: Option<&str>, file_name: &str) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|s| !s.is_empty()) {
        return declared.to_string();
    }
    infer_from_name(file_name).unwrap_or(DEFAULT_CONTENT_TYPE).to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(err.body_text());
    }
    ApiError::Validation(format!("Invalid multipart body: {}", err.body_text()))
}
