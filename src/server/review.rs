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
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use crate::fsrs::Rating;
use crate::scheduler::ReviewOption;
use crate::scheduler::commit;
use crate::scheduler::project;
use crate::server::cards::parse_card_id;
use crate::server::error::ApiError;
use crate::server::error::ApiResult;
use crate::server::state::ServerState;
use crate::types::card::Card;
use crate::types::timestamp::Timestamp;

/// Preview the four ratings for a card. Nothing is written.
pub async fn get_review(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ReviewOption>>> {
    state.authenticate(&headers)?;
    let id = parse_card_id(&id)?;
    let card = state
        .db
        .get_card(id)?
        .ok_or_else(|| ApiError::not_found("Card not found"))?;
    let projection = project(state.params(), &card.schedule, Timestamp::now());
    Ok(Json(projection.options()))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    rating: Value,
}

/// Commit a rating and return the updated card.
pub async fn post_review(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<Json<Card>> {
    state.authenticate(&headers)?;
    let Json(body) = body.map_err(|_| ApiError::InvalidRating)?;
    let rating = parse_rating(&body.rating)?;
    let id = parse_card_id(&id)?;

    let now = Timestamp::now();
    let params = state.params();
    let card = state
        .db
        .review_card(id, now, |schedule| commit(params, schedule, rating, now))?
        .ok_or_else(|| ApiError::not_found("Card not found"))?;

    if let Some(memory) = card.schedule.memory {
        let diff_percent = ((memory.difficulty - 1.0) / 9.0) * 100.0;
        log::debug!(
            "{} {} S={:.2}d D={:.2}% due={}",
            &card.id.to_string()[..8],
            rating.as_str(),
            memory.stability,
            diff_percent,
            card.schedule.due
        );
    }
    Ok(Json(card))
}

/// Ratings arrive as a number from 1 to 4. The names `again`, `hard`,
/// `good` and `easy` are accepted as well.
fn parse_rating(value: &Value) -> ApiResult<Rating> {
    let rating = match value {
        Value::Number(n) => n.as_i64().map(Rating::try_from),
        Value::String(s) => Some(Rating::try_from(s.as_str())),
        _ => None,
    };
    match rating {
        Some(Ok(rating)) => Ok(rating),
        _ => Err(ApiError::InvalidRating),
    }
}
