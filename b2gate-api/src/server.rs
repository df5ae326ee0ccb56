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

//! Axum HTTP server setup and routing.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use b2gate_core::{ObjectStore, ResolvedConfig, UrlIssuer};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::metrics_middleware;

/// Default maximum upload size (100MB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Default directory holding the frontend assets.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Shared application state for all handlers.
///
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Object store client.
    pub store: Arc<dyn ObjectStore>,
    /// Resolved storage configuration.
    pub config: Arc<ResolvedConfig>,
    /// Signed URL issuer bound to the configured bucket.
    pub issuer: UrlIssuer,
    /// Directory holding `index.html`, `styles.css` and `script.js`.
    pub static_dir: PathBuf,
    /// Maximum request body size in bytes.
    pub max_upload_size: usize,
    /// Prometheus metrics handle for rendering `/metrics` endpoint.
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ResolvedConfig, store: Arc<dyn ObjectStore>) -> Self {
        let issuer = UrlIssuer::new(store.clone(), config.bucket_name.clone());
        Self {
            store,
            config: Arc::new(config),
            issuer,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            prometheus_handle: None,
        }
    }

    /// Sets the static asset directory.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Sets the maximum request body size.
    pub fn with_max_upload_size(mut self, max_upload_size: usize) -> Self {
        self.max_upload_size = max_upload_size;
        self
    }

    /// Sets the Prometheus handle for rendering metrics.
    pub fn with_prometheus_handle(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus_handle = Some(handle);
        self
    }
}

/// Creates the application router.
pub fn create_router(state: AppState) -> Router {
    // The frontend may be served from another origin during development
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let api_router = Router::new()
        .route(
            "/generate-download-url",
            post(handlers::urls::generate_download_url),
        )
        .route(
            "/generate-upload-url",
            post(handlers::urls::generate_upload_url),
        )
        .route("/test-upload-url", post(handlers::urls::test_upload_url))
        .route("/list-files", get(handlers::files::list_files))
        .route("/upload-file", post(handlers::files::upload_file))
        .route("/check-config", get(handlers::diagnostics::check_config));

    Router::new()
        .nest("/api", api_router)
        // Frontend assets
        .route("/", get(handlers::assets::index))
        .route("/styles.css", get(handlers::assets::styles))
        .route("/script.js", get(handlers::assets::script))
        // Observability
        .route("/metrics", get(handlers::stats::prometheus_metrics))
        .layer(cors)
        // Add tracing layer for request logging
        .layer(TraceLayer::new_for_http())
        // Add metrics middleware to record request count and latency
        .layer(middleware::from_fn(metrics_middleware))
        // Bound proxy uploads
        .layer(DefaultBodyLimit::max(state.max_upload_size))
        // Attach shared state
        .with_state(state)
}
