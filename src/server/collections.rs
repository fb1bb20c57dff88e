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
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::server::error::ApiError;
use crate::server::error::ApiResult;
use crate::server::state::ServerState;
use crate::types::collection::Collection;
use crate::types::collection::CollectionPatch;
use crate::types::id::CollectionId;
use crate::types::timestamp::Timestamp;

pub fn parse_collection_id(id: &str) -> ApiResult<CollectionId> {
    CollectionId::parse(id).map_err(|_| ApiError::not_found("Collection not found"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    #[serde(flatten)]
    collection: Collection,
    card_count: usize,
}

pub async fn list_collections(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CollectionSummary>>> {
    state.authenticate(&headers)?;
    let collections = state
        .db
        .collections()?
        .into_iter()
        .map(|(collection, card_count)| CollectionSummary {
            collection,
            card_count,
        })
        .collect();
    Ok(Json(collections))
}

#[derive(Deserialize)]
pub struct NewCollection {
    name: Option<String>,
    description: Option<String>,
}

pub async fn create_collection(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Result<Json<NewCollection>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Collection>)> {
    state.authenticate(&headers)?;
    let Json(body) = body?;
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ApiError::bad_request("Name is required")),
    };
    let collection = Collection::new(name, body.description.as_deref(), Timestamp::now());
    state.db.insert_collection(&collection)?;
    Ok((StatusCode::CREATED, Json(collection)))
}

pub async fn get_collection(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Collection>> {
    state.authenticate(&headers)?;
    let id = parse_collection_id(&id)?;
    let collection = state
        .db
        .get_collection(id)?
        .ok_or_else(|| ApiError::not_found("Collection not found"))?;
    Ok(Json(collection))
}

pub async fn update_collection(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<CollectionPatch>, JsonRejection>,
) -> ApiResult<Json<Collection>> {
    state.authenticate(&headers)?;
    let id = parse_collection_id(&id)?;
    let Json(patch) = body?;
    let collection = state
        .db
        .update_collection(id, patch, Timestamp::now())?
        .ok_or_else(|| ApiError::not_found("Collection not found"))?;
    Ok(Json(collection))
}

/// Delete a collection together with its cards.
pub async fn delete_collection(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.authenticate(&headers)?;
    let id = parse_collection_id(&id)?;
    if !state.db.delete_collection(id)? {
        return Err(ApiError::not_found("Collection not found"));
    }
    Ok(Json(json!({ "success": true })))
}
