//! HTTP Surface
//!
//! Thin axum adapters over the services: request validation, service call,
//! response mapping. Domain errors become status codes in one place
//! (`AppError::into_response`); no handler carries business logic.

pub mod schemas;

mod chat;
mod competitive;
mod documents;
mod flashcards;
mod quiz;
mod summary;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::startup::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_mb * 1024 * 1024;

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload::upload))
        .route("/documents/list", get(documents::list))
        .route("/chat", post(chat::chat))
        .route("/quiz", post(quiz::generate))
        .route("/quiz/evaluate-answer", post(quiz::evaluate_answer))
        .route("/summary", post(summary::generate))
        .route("/flashcards", post(flashcards::generate))
        .route("/competitive-quiz/generate-bank", post(competitive::generate_bank))
        .route("/competitive-quiz/start", post(competitive::start))
        .route("/competitive-quiz/answer", post(competitive::answer))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
