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

//! Metrics endpoint integration tests.
//!
//! Uses in-process requests via tower::ServiceExt::oneshot.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use b2gate_api::{create_router, AppState};
use b2gate_core::{
    ChunkSource, ObjectListing, ObjectStore, PresignRequest, ResolvedConfig, SigningError,
    StorageError,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Store that signs fake URLs and holds nothing.
struct NullStore;

#[async_trait]
impl ObjectStore for NullStore {
    async fn presign(&self, request: &PresignRequest) -> Result<String, SigningError> {
        Ok(format!("https://s3.test/{}/{}?X-Amz-Signature=fake", request.bucket, request.key))
    }

    async fn list_objects(&self, _bucket: &str) -> Result<ObjectListing, StorageError> {
        Ok(ObjectListing::default())
    }

    async fn head_bucket(&self, _bucket: &str) -> Result<(), StorageError> {
        Ok(())
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

fn create_test_state() -> AppState {
    let config = ResolvedConfig {
        access_key_id: "0050428f1a906270000000001".to_string(),
        secret_key: "K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string(),
        endpoint_url: "http://localhost:9000".to_string(),
        bucket_name: "mybucket".to_string(),
        region: "us-east-1".to_string(),
        expected_key_id: None,
    };
    AppState::new(config, Arc::new(NullStore))
}

/// Helper to read response body as string.
async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_metrics_disabled_returns_503() {
    let app = create_router(create_test_state());

    let response = app
        .oneshot(Request::builder().method("GET").uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_prometheus_metrics_with_recorder() {
    // Install a test-local Prometheus recorder
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let handle = builder.install_recorder().expect("Failed to install recorder");

    let app = create_router(create_test_state().with_prometheus_handle(handle));

    // Issue a URL so both request and issuance metrics exist
    let _ = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate-download-url")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"file_name":"a.txt"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(Request::builder().method("GET").uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_string(response.into_body()).await;
    assert!(
        body.contains("http_requests_total"),
        "Expected request counter in body, got: {}",
        &body[..body.len().min(500)]
    );
    assert!(body.contains("presigned_urls_issued_total"));
    assert!(body.contains("operation=\"download\""));
}
