use axum::extract::State;
use axum::Json;

use crate::api::schemas::{
    EvaluateAnswerRequest, EvaluateAnswerResponse, QuizRequest, QuizResponse,
};
use crate::error::AppError;
use crate::generate::schema::QuizItemType;
use crate::startup::AppState;

/// `POST /quiz`: generate a quiz from an indexed document.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    if request.document_id.trim().is_empty() {
        return Err(AppError::BadInput(
            "document_id must not be empty".to_string(),
        ));
    }
    if request.num_questions == 0 || request.num_questions > 50 {
        return Err(AppError::BadInput(format!(
            "num_questions must be between 1 and 50, got {}",
            request.num_questions
        )));
    }
    if request.question_types.is_empty() {
        return Err(AppError::BadInput(
            "question_types must not be empty".to_string(),
        ));
    }

    let mut types = Vec::with_capacity(request.question_types.len());
    for raw in &request.question_types {
        let parsed = match raw.trim() {
            "multiple_choice" => QuizItemType::MultipleChoice,
            "short_answer" => QuizItemType::ShortAnswer,
            other => {
                return Err(AppError::BadInput(format!(
                    "Unknown question type \"{other}\""
                )))
            }
        };
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }

    let quiz = state
        .generator
        .generate_quiz(&request.document_id, request.num_questions, &types)
        .await?;

    Ok(Json(QuizResponse { quiz }))
}

/// `POST /quiz/evaluate-answer`: semantic grading of a short answer.
pub async fn evaluate_answer(
    State(state): State<AppState>,
    Json(request): Json<EvaluateAnswerRequest>,
) -> Result<Json<EvaluateAnswerResponse>, AppError> {
    if request.question.trim().is_empty() || request.correct_answer.trim().is_empty() {
        return Err(AppError::BadInput(
            "question and correct_answer must not be empty".to_string(),
        ));
    }

    let evaluation = state
        .generator
        .evaluate_answer(
            &request.user_answer,
            &request.correct_answer,
            &request.question,
        )
        .await?;

    Ok(Json(EvaluateAnswerResponse {
        is_correct: evaluation.is_correct,
        feedback: evaluation.feedback,
    }))
}
