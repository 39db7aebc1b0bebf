use axum::extract::State;
use axum::Json;

use crate::api::schemas::{DocumentEntry, DocumentsListResponse};
use crate::error::AppError;
use crate::startup::AppState;

/// `GET /documents/list`: every indexed document with its vector count.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<DocumentsListResponse>, AppError> {
    let documents: Vec<DocumentEntry> = state
        .ingestion
        .list_documents()
        .await?
        .into_iter()
        .map(|d| DocumentEntry {
            document_id: d.document_id,
            filename: d.filename,
            vector_count: d.vector_count,
        })
        .collect();

    Ok(Json(DocumentsListResponse {
        total: documents.len(),
        documents,
    }))
}
