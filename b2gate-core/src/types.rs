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

//! Request and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Operation granted by a pre-signed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlOperation {
    /// GET an object.
    Download,
    /// PUT an object.
    Upload,
}

impl UrlOperation {
    /// HTTP method embedded in the signature.
    pub fn method(&self) -> &'static str {
        match self {
            UrlOperation::Download => "GET",
            UrlOperation::Upload => "PUT",
        }
    }

    /// Lowercase label for logs, metrics and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlOperation::Download => "download",
            UrlOperation::Upload => "upload",
        }
    }
}

/// Body of `POST /api/generate-{download,upload}-url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignedUrlRequest {
    /// Object key.
    pub file_name: Option<String>,
    /// Lifetime in seconds (default 3600).
    pub expiration: Option<i64>,
}

/// An issued pre-signed URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedUrl {
    /// Signed URL, exactly as produced by the signer.
    pub url: String,
    /// Object key.
    pub file_name: String,
    /// Lifetime in seconds.
    pub expiration_seconds: u64,
    /// Issuance time plus lifetime, in fractional Unix seconds.
    pub expires_at: f64,
}

/// One object from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    /// Object key.
    pub name: String,
    /// Size in bytes.
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Last modification time, serialized as ISO-8601.
    #[serde(serialize_with = "serialize_iso8601")]
    pub last_modified: DateTime<Utc>,
}

/// The first page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Objects, in store order.
    pub objects: Vec<ObjectSummary>,
    /// The store reported more results than were returned.
    pub is_truncated: bool,
}

fn serialize_iso8601<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_operation_methods() {
        assert_eq!(UrlOperation::Download.method(), "GET");
        assert_eq!(UrlOperation::Upload.method(), "PUT");
        assert_eq!(UrlOperation::Upload.as_str(), "upload");
    }

    #[test]
    fn test_object_summary_serialization() {
        let summary = ObjectSummary {
            name: "photos/cat.jpg".to_string(),
            size_bytes: 1024,
            last_modified: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["name"], "photos/cat.jpg");
        assert_eq!(json["size"], 1024);
        assert_eq!(json["last_modified"], "2024-01-02T03:04:05+00:00");
    }
}
