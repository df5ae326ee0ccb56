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

//! HTTP request handlers.
//!
//! This module provides handlers for:
//! - Signed URL issuance and URL sanity checks
//! - Bucket listing and proxy upload
//! - Configuration diagnostics
//! - Static frontend assets
//! - Prometheus metrics

pub mod assets;
pub mod content_type;
pub mod diagnostics;
pub mod files;
pub mod stats;
pub mod urls;

pub use diagnostics::check_config;
pub use files::{list_files, upload_file, ListFilesResponse, UploadFileResponse};
pub use urls::{
    generate_download_url, generate_upload_url, test_upload_url, SignedUrlResponse,
    TestUrlRequest, TestUrlResponse,
};
