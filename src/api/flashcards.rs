use axum::extract::State;
use axum::Json;

use crate::api::schemas::{FlashcardsRequest, FlashcardsResponse};
use crate::error::AppError;
use crate::startup::AppState;

/// `POST /flashcards`: flashcard set from an indexed document.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<FlashcardsRequest>,
) -> Result<Json<FlashcardsResponse>, AppError> {
    if request.document_id.trim().is_empty() {
        return Err(AppError::BadInput(
            "document_id must not be empty".to_string(),
        ));
    }
    if request.num_flashcards == 0 || request.num_flashcards > 100 {
        return Err(AppError::BadInput(format!(
            "num_flashcards must be between 1 and 100, got {}",
            request.num_flashcards
        )));
    }

    let flashcards = state
        .generator
        .generate_flashcards(&request.document_id, request.num_flashcards)
        .await?;

    Ok(Json(FlashcardsResponse { flashcards }))
}
