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

//! Static frontend assets.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::content_type::{infer_from_name, DEFAULT_CONTENT_TYPE};
use crate::error::ApiError;
use crate::server::AppState;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Result<Response, ApiError> {
    serve(&state, "index.html").await
}

/// `GET /styles.css`
pub async fn styles(State(state): State<AppState>) -> Result<Response, ApiError> {
    serve(&state, "styles.css").await
}

/// `GET /script.js`
pub async fn script(State(state): State<AppState>) -> Result<Response, ApiError> {
    serve(&state, "script.js").await
}

async fn serve(state: &AppState, name: &str) -> Result<Response, ApiError> {
    let path = state.static_dir.join(name);
    let body = tokio::fs::read(&path).await.map_err(|e| {
        debug!("Static asset {} unavailable: {}", path.display(), e);
        ApiError::NotFound(format!("{} not found", name))
    })?;

    let content_type = infer_from_name(name).unwrap_or(DEFAULT_CONTENT_TYPE);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        body,
    )
        .into_response())
}
