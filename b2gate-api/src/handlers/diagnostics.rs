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

//! Configuration diagnostics handler.

use axum::{extract::State, Json};
use b2gate_core::ConfigReport;

use crate::server::AppState;

/// `GET /api/check-config`
///
/// Always answers 200; probe failures are reported in the body.
pub async fn check_config(State(state): State<AppState>) -> Json<ConfigReport> {
    Json(b2gate_core::check_config(&state.config, state.store.as_ref()).await)
}
