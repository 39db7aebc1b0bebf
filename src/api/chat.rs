use axum::extract::State;
use axum::Json;

use crate::api::schemas::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::startup::AppState;

/// `POST /chat`: grounded question answering with fallback.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::BadInput("Question must not be empty".to_string()));
    }
    if request.document_id.trim().is_empty() {
        return Err(AppError::BadInput(
            "document_id must not be empty".to_string(),
        ));
    }

    let result = state
        .qa
        .answer(&request.document_id, &request.question)
        .await?;

    Ok(Json(ChatResponse {
        answer: result.answer,
        sources: result.sources,
        from_document: result.from_document,
        filename: request.filename,
    }))
}
