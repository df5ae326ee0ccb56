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

//! Application initialization and runtime.
//!
//! This module handles:
//! - Object store client setup
//! - HTTP server setup and routing
//! - TLS/HTTPS configuration
//! - Graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use b2gate_api::{create_router, AppState};
use b2gate_core::{ObjectStore, S3Store};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{Config, TlsConfig};

/// Main application.
pub struct App {
    config: Config,
    /// Client for the configured bucket.
    store: Arc<dyn ObjectStore>,
}

impl App {
    /// Creates a new application instance.
    ///
    /// Builds the S3 client from the resolved storage configuration.
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing b2gate...");

        let store = S3Store::new(&config.storage, config.server.storage_timeout)
            .context("Failed to create S3 client")?;

        info!("S3 client created for {}", config.storage.endpoint_url);

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Runs the application (HTTP/HTTPS server).
    ///
    /// If TLS is configured via `B2GATE_TLS_CERT` and `B2GATE_TLS_KEY`,
    /// the server will use HTTPS. Otherwise, it runs as HTTP.
    pub async fn run(self) -> Result<()> {
        // Validate TLS configuration early
        self.config
            .server
            .tls
            .validate()
            .map_err(|e| anyhow::anyhow!("TLS configuration error: {}", e))?;

        info!(
            "Max upload size: {} bytes ({:.2} MB)",
            self.config.server.max_upload_size,
            self.config.server.max_upload_size as f64 / (1024.0 * 1024.0)
        );
        info!("Static assets: {:?}", self.config.server.static_dir);

        let addr: SocketAddr = self
            .config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.server.bind))?;

        let tls_config = if self.config.server.tls.enabled {
            Some(load_tls_config(&self.config.server.tls).await?)
        } else {
            None
        };

        let mut state = AppState::new(self.config.storage.clone(), self.store.clone())
            .with_static_dir(self.config.server.static_dir.clone())
            .with_max_upload_size(self.config.server.max_upload_size);
        if let Some(handle) = self.install_prometheus() {
            state = state.with_prometheus_handle(handle);
        }

        let router = create_router(state);

        if let Some(rustls_config) = tls_config {
            info!("Listening on https://{}", addr);
            run_https_server(addr, router, rustls_config).await
        } else {
            info!("Listening on http://{}", addr);
            run_http_server(addr, router).await
        }
    }

    /// Installs the Prometheus recorder if enabled.
    fn install_prometheus(&self) -> Option<PrometheusHandle> {
        if !self.config.metrics.prometheus_enabled {
            info!("Prometheus metrics disabled");
            return None;
        }

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics enabled (available at /metrics)");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}. Metrics disabled.", e);
                None
            }
        }
    }
}

/// Loads a rustls configuration from the configured PEM files.
pub async fn load_tls_config(
    tls_config: &TlsConfig,
) -> Result<axum_server::tls_rustls::RustlsConfig> {
    use axum_server::tls_rustls::RustlsConfig;

    let cert_path = tls_config.cert_path.as_ref().context("TLS certificate path not configured")?;
    let key_path = tls_config.key_path.as_ref().context("TLS private key path not configured")?;

    info!("Loading TLS certificate from {:?}", cert_path);
    info!("Loading TLS private key from {:?}", key_path);

    let rustls_config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .context("Failed to load TLS certificate and key")?;

    info!("TLS configured successfully");
    Ok(rustls_config)
}

/// Runs the HTTP server (without TLS).
async fn run_http_server(addr: SocketAddr, router: axum::Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Runs the HTTPS server (with TLS).
async fn run_https_server(
    addr: SocketAddr,
    router: axum::Router,
    rustls_config: axum_server::tls_rustls::RustlsConfig,
) -> Result<()> {
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handles graceful shutdown signals.
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown...");
        }
    }
}
