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

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;

use crate::data_dir::DataDir;
use crate::error::Fallible;
use crate::server::cards::create_card;
use crate::server::cards::delete_card;
use crate::server::cards::get_card;
use crate::server::cards::list_cards;
use crate::server::cards::update_card;
use crate::server::collections::create_collection;
use crate::server::collections::delete_collection;
use crate::server::collections::get_collection;
use crate::server::collections::list_collections;
use crate::server::collections::update_collection;
use crate::server::error::ApiError;
use crate::server::review::get_review;
use crate::server::review::post_review;
use crate::server::session::login;
use crate::server::session::logout;
use crate::server::state::ServerState;
use crate::server::stats::stats;

pub async fn start_server(directory: Option<String>, port: u16) -> Fallible<()> {
    let data = DataDir::open(directory)?;
    log::debug!("Serving data from {}", data.directory.display());
    let state = ServerState::new(data.db, data.config);
    let app = router(state);
    let bind = format!("0.0.0.0:{port}");

    log::debug!("Starting server on {bind}");
    let listener = TcpListener::bind(&bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn router(state: ServerState) -> Router {
    let app = Router::new();
    let app = app.route("/api/auth", post(login).delete(logout));
    let app = app.route(
        "/api/collections",
        get(list_collections).post(create_collection),
    );
    let app = app.route(
        "/api/collections/{id}",
        get(get_collection)
            .put(update_collection)
            .delete(delete_collection),
    );
    let app = app.route("/api/cards", get(list_cards).post(create_card));
    let app = app.route(
        "/api/cards/{id}",
        get(get_card).put(update_card).delete(delete_card),
    );
    let app = app.route("/api/cards/{id}/review", get(get_review).post(post_review));
    let app = app.route("/api/stats", get(stats));
    let app = app.fallback(not_found_handler);
    app.with_state(state)
}

async fn not_found_handler() -> ApiError {
    ApiError::not_found("Not found")
}

async fn shutdown_signal() {
    if ctrl_c().await.is_ok() {
        log::debug!("Shutting down.");
    }
}
