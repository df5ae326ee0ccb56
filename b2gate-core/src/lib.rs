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

//! B2Gate Core - credentials, signing and object-store access.
//!
//! This crate contains everything that is not HTTP-server specific:
//! - Configuration resolution from aliased environment entries
//! - Secret masking for logs and diagnostics
//! - The `ObjectStore` abstraction and its `aws-sdk-s3` implementation,
//!   including pre-signed URLs and streamed multipart uploads
//! - Signed URL issuance and the configuration health report

pub mod config;
pub mod error;
pub mod health;
pub mod issuer;
pub mod mask;
pub mod store;
pub mod types;

pub use config::{ConfigSource, DebugInfo, EnvSource, Field, ResolvedConfig};
pub use error::{ConfigError, IssueError, SigningError, StorageError, ValidationError};
pub use health::{check_config, ConfigReport};
pub use issuer::{UrlIssuer, DEFAULT_EXPIRATION_SECS};
pub use mask::{key_id_preview, mask_secret};
pub use store::{BytesSource, ChunkSource, ObjectStore, PresignRequest, S3Store};
pub use types::{ObjectListing, ObjectSummary, SignedUrl, SignedUrlRequest, UrlOperation};
