use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::schemas::UploadResponse;
use crate::error::AppError;
use crate::ingestion::UploadedFile;
use crate::startup::AppState;

/// `POST /upload`: index one or more PDFs under a fresh document id.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadInput(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::BadInput(format!(
                "Only PDF files are accepted, got {filename}"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadInput(format!("Failed to read {filename}: {e}")))?
            .to_vec();
        if bytes.is_empty() {
            return Err(AppError::BadInput(format!("File {filename} is empty")));
        }
        files.push(UploadedFile { filename, bytes });
    }

    let result = state.ingestion.ingest(files).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            document_id: result.document_id,
            filename: result.filenames.join(", "),
            page_count: result.page_count,
            chunks_created: result.chunk_count,
        }),
    ))
}
