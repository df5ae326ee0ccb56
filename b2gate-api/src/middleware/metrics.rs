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

//! Metrics middleware for recording HTTP request metrics.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Paths reported verbatim; everything else is folded into one label.
const KNOWN_PATHS: &[&str] = &[
    "/",
    "/styles.css",
    "/script.js",
    "/metrics",
    "/api/generate-download-url",
    "/api/generate-upload-url",
    "/api/test-upload-url",
    "/api/list-files",
    "/api/upload-file",
    "/api/check-config",
];

/// Middleware that records HTTP request count and latency metrics.
///
/// Records two metrics via the `metrics` crate:
/// - `http_requests_total` (counter): labeled by method, status and path.
/// - `http_request_duration_seconds` (histogram): labeled by method and path.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    metrics::counter!("http_requests_total", "method" => method.clone(), "status" => status, "path" => path.clone())
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(duration);

    response
}

/// Normalizes request paths to avoid label cardinality explosion.
///
/// Routed paths keep their name; unknown paths (probes, typos) become `/other`.
fn normalize_path(path: &str) -> String {
    if KNOWN_PATHS.contains(&path) {
        path.to_string()
    } else {
        "/other".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_root() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_normalize_path_api() {
        assert_eq!(normalize_path("/api/list-files"), "/api/list-files");
        assert_eq!(normalize_path("/api/check-config"), "/api/check-config");
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/wp-login.php"), "/other");
        assert_eq!(normalize_path("/api/list-files/extra"), "/other");
    }
}
