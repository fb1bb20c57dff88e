// Copyright 2025 Fernando Borretti
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

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use crate::cmd::stats::Stats;
use crate::cmd::stats::get_stats;
use crate::server::error::ApiResult;
use crate::server::state::ServerState;
use crate::types::timestamp::Timestamp;

pub async fn stats(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> ApiResult<Json<Stats>> {
    state.authenticate(&headers)?;
    Ok(Json(get_stats(&state.db, Timestamp::now())?))
}
