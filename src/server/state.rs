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

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::auth::check_auth;
use crate::config::Config;
use crate::db::Database;
use crate::scheduler::Parameters;
use crate::server::error::ApiError;
use crate::server::error::ApiResult;
use crate::types::timestamp::Timestamp;

#[derive(Clone)]
pub struct ServerState {
    pub db: Database,
    pub config: Arc<Config>,
}

impl ServerState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.config.scheduler
    }

    /// Reject the request unless it carries valid credentials.
    pub fn authenticate(&self, headers: &HeaderMap) -> ApiResult<()> {
        if check_auth(headers, &self.config.auth, Timestamp::now()) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
