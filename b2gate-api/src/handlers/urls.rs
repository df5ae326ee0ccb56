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

//! Signed URL handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use b2gate_core::{SignedUrl, SignedUrlRequest, UrlOperation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::AppState;

/// Note returned with every URL check.
pub const CORS_NOTE: &str = "For direct browser uploads, CORS must be configured on the bucket \
     to allow PUT from this origin. Use /api/upload-file to upload through the server instead.";

/// Response body for URL issuance.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub success: bool,
    #[serde(flatten)]
    pub signed: SignedUrl,
}

/// Request body for `POST /api/test-upload-url`.
#[derive(Debug, Default, Deserialize)]
pub struct TestUrlRequest {
    pub url: Option<String>,
}

/// Response body for `POST /api/test-upload-url`.
#[derive(Debug, Serialize)]
pub struct TestUrlResponse {
    pub success: bool,
    pub url_valid: bool,
    pub note: &'static str,
}

/// `POST /api/generate-download-url`
pub async fn generate_download_url(
    State(state): State<AppState>,
    payload: Result<Json<SignedUrlRequest>, JsonRejection>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    issue(&state, UrlOperation::Download, payload).await
}

/// `POST /api/generate-upload-url`
pub async fn generate_upload_url(
    State(state): State<AppState>,
    payload: Result<Json<SignedUrlRequest>, JsonRejection>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    issue(&state, UrlOperation::Upload, payload).await
}

async fn issue(
    state: &AppState,
    operation: UrlOperation,
    payload: Result<Json<SignedUrlRequest>, JsonRejection>,
) -> Result<Json<SignedUrlResponse>, ApiError> {
    let Json(request) = payload.map_err(rejection_to_error)?;
    let signed = state.issuer.issue(operation, &request).await?;
    Ok(Json(SignedUrlResponse {
        success: true,
        signed,
    }))
}

/// `POST /api/test-upload-url`
///
/// Checks only the shape of the URL; the store is not contacted.
pub async fn test_upload_url(
    payload: Result<Json<TestUrlRequest>, JsonRejection>,
) -> Result<Json<TestUrlResponse>, ApiError> {
    let Json(request) = payload.map_err(rejection_to_error)?;
    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("URL is required".to_string()))?;

    Ok(Json(TestUrlResponse {
        success: true,
        url_valid: looks_presigned(&url),
        note: CORS_NOTE,
    }))
}

/// True for http(s) URLs carrying SigV4 or legacy SigV2 query authentication.
pub fn looks_presigned(url: &str) -> bool {
    url.starts_with("http") && (url.contains("X-Amz") || url.contains("AWSAccessKeyId"))
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
}
