use axum::extract::State;
use axum::Json;

use crate::api::schemas::{SummaryRequest, SummaryResponse};
use crate::error::AppError;
use crate::generate::SummaryLength;
use crate::startup::AppState;

/// `POST /summary`: structured summary of an indexed document.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    if request.document_id.trim().is_empty() {
        return Err(AppError::BadInput(
            "document_id must not be empty".to_string(),
        ));
    }
    let length = SummaryLength::parse(&request.length).ok_or_else(|| {
        AppError::BadInput(format!(
            "length must be short, medium, or long, got \"{}\"",
            request.length
        ))
    })?;

    let summary = state
        .generator
        .generate_summary(&request.document_id, length)
        .await?;

    Ok(Json(SummaryResponse { summary }))
}
