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

//! Error types shared by the core components.

use thiserror::Error;

/// Errors raised while resolving configuration at startup.
///
/// These are fatal: the server must not start without valid credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required logical field had no non-empty alias.
    #[error("{variable} is required (set one of: {aliases})")]
    MissingField {
        /// Logical field name (e.g. "access key id").
        field: &'static str,
        /// Primary variable name the operator is expected to set.
        variable: &'static str,
        /// All accepted aliases, comma separated.
        aliases: String,
    },

    /// The endpoint could not be parsed as an absolute URL with a host.
    #[error("Invalid endpoint URL '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Normalized endpoint value.
        endpoint: String,
        /// Parser error or missing component.
        reason: String,
    },
}

/// Failure of the pre-signed URL primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Error generating {operation} URL: {reason}")]
pub struct SigningError {
    /// Operation being signed ("download" or "upload").
    pub operation: &'static str,
    /// Underlying message.
    pub reason: String,
}

impl SigningError {
    /// Creates a new signing error.
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

/// A request failed validation before any backend call was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Errors from URL issuance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// Bad request input.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The signer rejected the request.
    #[error(transparent)]
    Signing(#[from] SigningError),
}

/// Errors from the object store.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// The store answered with an error status.
    #[error("{code}: {message} (HTTP {status})")]
    Service {
        /// HTTP status code.
        status: u16,
        /// S3 error code, or the reason phrase when the body was empty.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The upload body could not be read from its source.
    #[error("Upload body error: {0}")]
    Source(String),

    /// The client could not be constructed from the configuration.
    #[error("Client configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Short type tag reported to API clients alongside the message.
    pub fn error_type(&self) -> &str {
        match self {
            StorageError::Service { code, .. } => code,
            StorageError::Transport(_) => "TransportError",
            StorageError::InvalidResponse(_) => "InvalidResponse",
            StorageError::Source(_) => "UploadBodyError",
            StorageError::Configuration(_) => "ConfigurationError",
        }
    }

    /// Returns true when the failure looks like missing permissions on the bucket.
    pub fn is_permission_error(&self) -> bool {
        let text = self.to_string();
        if text.contains("UnauthorizedAccess") || text.to_lowercase().contains("not authorized") {
            return true;
        }
        matches!(self, StorageError::Service { status: 401 | 403, .. })
    }
}
