//! HTTP surface: a thin orchestration of the core components with no
//! independent business logic.

pub mod error;
mod history;
mod rate;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::response::Json;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rate", get(rate::get_rate))
        .route("/history", post(history::save_rate))
        .route("/history/public", get(history::public_history))
        .route("/history/me", get(history::personal_history))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
