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

//! API error type and its JSON response mapping.
//!
//! Every error body is a JSON object with an `error` field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use b2gate_core::{DebugInfo, IssueError, SigningError, StorageError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by API handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request input.
    #[error("{0}")]
    Validation(String),

    /// The signer failed.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The object store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The object store failed and the operator needs context to diagnose it.
    #[error("{source}")]
    StorageDiagnostic {
        /// Underlying failure.
        source: StorageError,
        /// Non-sensitive configuration context.
        debug_info: DebugInfo,
    },

    /// Static asset missing.
    #[error("{0}")]
    NotFound(String),

    /// Request body exceeds the configured upload limit.
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Signing(_) | ApiError::Storage(_) | ApiError::StorageDiagnostic { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Validation(e) => e.into(),
            IssueError::Signing(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::StorageDiagnostic { source, debug_info } => json!({
                "error": source.to_string(),
                "error_type": source.error_type(),
                "debug_info": debug_info,
            }),
            other => json!({
                "error": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(SigningError::new("upload", "boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(StorageError::Transport("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_issue_error_mapping() {
        let err: ApiError =
            IssueError::Validation(ValidationError("file_name is required".into())).into();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "file_name is required"));

        let err: ApiError = IssueError::Signing(SigningError::new("download", "bad")).into();
        assert_eq!(err.to_string(), "Error generating download URL: bad");
    }
}
