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

//! Object store access.

pub mod s3;

pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{SigningError, StorageError};
use crate::types::{ObjectListing, UrlOperation};

/// Longest lifetime a pre-signed URL may have (seven days).
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 604_800;

/// Parameters for a pre-signed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Operation the URL grants.
    pub operation: UrlOperation,
    /// Target bucket.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Lifetime in seconds.
    pub expires_in_secs: u64,
    /// Signing time.
    pub signed_at: DateTime<Utc>,
}

/// Pull-based source of upload data.
///
/// The store asks for one chunk at a time, so an upload never has to be
/// held in memory as a whole.
#[async_trait]
pub trait ChunkSource: Send {
    /// Returns the next chunk, or `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StorageError>;
}

/// A [`ChunkSource`] over data that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct BytesSource {
    data: Option<Bytes>,
}

impl BytesSource {
    /// Wraps `data` as a single-chunk source.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
        }
    }
}

#[async_trait]
impl ChunkSource for BytesSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, StorageError> {
        Ok(self.data.take())
    }
}

/// Object store interface.
///
/// Implementations are shared across concurrent requests behind an `Arc`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Builds a pre-signed URL. Signing is local; no request reaches the store.
    async fn presign(&self, request: &PresignRequest) -> Result<String, SigningError>;

    /// Lists the first page of objects in a bucket.
    async fn list_objects(&self, bucket: &str) -> Result<ObjectListing, StorageError>;

    /// Checks that the bucket exists and the credentials may access it.
    async fn head_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// Streams an object into the store and returns the number of bytes written.
    ///
    /// # Arguments
    ///
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    /// * `body` - Object data, pulled chunk by chunk
    /// * `content_type` - MIME type
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &mut dyn ChunkSource,
        content_type: &str,
    ) -> Result<u64, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bytes_source_yields_once() {
        let mut source = BytesSource::new(Bytes::from_static(b"hello"));
        assert_eq!(source.next_chunk().await.unwrap(), Some(Bytes::from_static(b"hello")));
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_bytes_source() {
        let mut source = BytesSource::new(Vec::new());
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }
}
