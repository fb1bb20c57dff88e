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
use axum::extract::Query;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::server::collections::parse_collection_id;
use crate::server::error::ApiError;
use crate::server::error::ApiResult;
use crate::server::state::ServerState;
use crate::types::card::Card;
use crate::types::card::CardPatch;
use crate::types::id::CardId;
use crate::types::timestamp::Timestamp;

/// Unparseable ids cannot name a card, so they are reported as missing.
pub fn parse_card_id(id: &str) -> ApiResult<CardId> {
    CardId::parse(id).map_err(|_| ApiError::not_found("Card not found"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
    collection_id: Option<String>,
    due: Option<bool>,
    new: Option<bool>,
}

pub async fn list_cards(
    State(state): State<ServerState>,
    headers: HeaderMap,
    query: Result<Query<CardQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Card>>> {
    state.authenticate(&headers)?;
    let Query(query) = query?;
    let collection_id = match query.collection_id.as_deref() {
        Some(id) => Some(parse_collection_id(id)?),
        None => None,
    };
    let cards = if query.due == Some(true) {
        state.db.due_cards(Timestamp::now(), collection_id)?
    } else if query.new == Some(true) {
        state.db.new_cards(collection_id)?
    } else {
        state.db.cards(collection_id)?
    };
    Ok(Json(cards))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    collection_id: Option<String>,
    /// The name of the collection, as an alternative to its id.
    collection: Option<String>,
    front: Option<String>,
    back: Option<String>,
    note_id: Option<String>,
}

pub async fn create_card(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Result<Json<NewCard>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    state.authenticate(&headers)?;
    let Json(body) = body?;

    let collection_id = match (non_blank(body.collection_id), non_blank(body.collection)) {
        (Some(id), _) => {
            let id = parse_collection_id(&id)?;
            state
                .db
                .get_collection(id)?
                .ok_or_else(|| ApiError::not_found("Collection not found"))?
                .id
        }
        (None, Some(name)) => {
            state
                .db
                .collection_by_name(&name)?
                .ok_or_else(|| ApiError::not_found(format!("Collection \"{name}\" not found")))?
                .id
        }
        (None, None) => return Err(missing_fields()),
    };
    let (Some(front), Some(back)) = (non_blank(body.front), non_blank(body.back)) else {
        return Err(missing_fields());
    };

    let note_id = non_blank(body.note_id);
    let card = Card::new(collection_id, front, back, note_id, Timestamp::now());
    if !state.db.insert_card(&card)? {
        return Err(duplicate_note_id());
    }
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_card(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Card>> {
    state.authenticate(&headers)?;
    let id = parse_card_id(&id)?;
    let card = state
        .db
        .get_card(id)?
        .ok_or_else(|| ApiError::not_found("Card not found"))?;
    Ok(Json(card))
}

/// Edit the content of a card. The scheduling state can only be changed by
/// reviewing it.
pub async fn update_card(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<CardPatch>, JsonRejection>,
) -> ApiResult<Json<Card>> {
    state.authenticate(&headers)?;
    let id = parse_card_id(&id)?;
    let Json(patch) = body?;
    if let Some(collection_id) = patch.collection_id {
        if state.db.get_collection(collection_id)?.is_none() {
            return Err(ApiError::not_found("Collection not found"));
        }
    }
    if let Some(Some(note_id)) = &patch.note_id {
        if let Some(other) = state.db.card_by_note_id(note_id)? {
            if other.id != id {
                return Err(duplicate_note_id());
            }
        }
    }
    let card = state
        .db
        .update_card(id, patch, Timestamp::now())?
        .ok_or_else(|| ApiError::not_found("Card not found"))?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.authenticate(&headers)?;
    let id = parse_card_id(&id)?;
    if !state.db.delete_card(id)? {
        return Err(ApiError::not_found("Card not found"));
    }
    Ok(Json(json!({ "success": true })))
}

fn missing_fields() -> ApiError {
    ApiError::bad_request("collectionId (or collection), front, and back are required")
}

fn duplicate_note_id() -> ApiError {
    ApiError::Conflict("Card with this noteId already exists".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
