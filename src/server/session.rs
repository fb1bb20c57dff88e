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
use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::auth::check_credentials;
use crate::auth::clear_session_cookie;
use crate::auth::create_session;
use crate::auth::session_cookie;
use crate::server::error::ApiError;
use crate::server::error::ApiResult;
use crate::server::state::ServerState;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Log in with the configured credentials and receive a session cookie.
pub async fn login(
    State(state): State<ServerState>,
    body: Result<Json<Login>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(login) = body?;
    let auth = &state.config.auth;
    if !check_credentials(auth, &login.username, &login.password) {
        log::debug!("Rejected login for {:?}", login.username);
        return Err(ApiError::Unauthorized);
    }
    let session = create_session(auth, Timestamp::now());
    Ok((
        [(SET_COOKIE, session_cookie(auth, &session))],
        Json(json!({ "success": true })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_session_cookie())],
        Json(json!({ "success": true })),
    )
}
