use axum::extract::State;
use axum::Json;

use crate::api::schemas::{
    CompetitiveAnswerRequest, CompetitiveAnswerResponse, CompetitiveStartRequest,
    CompetitiveStartResponse, GenerateBankRequest, GenerateBankResponse,
};
use crate::error::AppError;
use crate::quiz::bank::BankSource;
use crate::startup::AppState;

/// `POST /competitive-quiz/generate-bank`: difficulty-stratified question
/// bank from a document or a free-text topic.
pub async fn generate_bank(
    State(state): State<AppState>,
    Json(request): Json<GenerateBankRequest>,
) -> Result<Json<GenerateBankResponse>, AppError> {
    if !(3..=100).contains(&request.num_questions) {
        return Err(AppError::BadInput(format!(
            "num_questions must be between 3 and 100, got {}",
            request.num_questions
        )));
    }

    let source = match (request.document_id, request.topic) {
        (Some(document_id), None) if !document_id.trim().is_empty() => {
            BankSource::Document(document_id)
        }
        (None, Some(topic)) if !topic.trim().is_empty() => BankSource::Topic(topic),
        _ => {
            return Err(AppError::BadInput(
                "Provide exactly one of document_id or topic".to_string(),
            ))
        }
    };

    let bank = state
        .competitive
        .generate_bank(request.num_questions, source)
        .await?;

    Ok(Json(GenerateBankResponse {
        quiz_id: bank.quiz_id.clone(),
        question_bank: bank.items.clone(),
    }))
}

/// `POST /competitive-quiz/start`: open a session against a bank.
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<CompetitiveStartRequest>,
) -> Result<Json<CompetitiveStartResponse>, AppError> {
    if !(5..=10).contains(&request.num_questions) {
        return Err(AppError::BadInput(format!(
            "num_questions must be between 5 and 10, got {}",
            request.num_questions
        )));
    }

    let started = state
        .competitive
        .start(&request.quiz_id, request.num_questions)
        .await?;

    Ok(Json(CompetitiveStartResponse {
        session_id: started.session_id,
        question: started.question,
        current_difficulty: started.current_difficulty,
    }))
}

/// `POST /competitive-quiz/answer`: grade a turn and serve the next one.
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<CompetitiveAnswerRequest>,
) -> Result<Json<CompetitiveAnswerResponse>, AppError> {
    let outcome = state
        .competitive
        .answer(&request.session_id, &request.question_id, &request.answer)
        .await?;

    Ok(Json(CompetitiveAnswerResponse {
        is_correct: outcome.is_correct,
        correct_answer: outcome.correct_answer,
        explanation: outcome.explanation,
        reward: outcome.reward,
        stats: outcome.stats,
        is_complete: outcome.is_complete,
        next_question: outcome.next_question,
        next_difficulty: outcome.next_difficulty,
    }))
}
