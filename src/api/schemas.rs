//! API Request/Response Schemas
//!
//! Wire types for every endpoint. Requests deserialize strictly enough to
//! catch shape errors early; range and cross-field validation happens in
//! the handlers so the errors carry useful messages.

use serde::{Deserialize, Serialize};

use crate::generate::schema::{FlashcardsPayload, QuizPayload, SummaryPayload};
use crate::qa::SourceRef;
use crate::quiz::adaptive::Difficulty;
use crate::quiz::bank::BankQuestion;
use crate::quiz::session::SessionStats;

// ============================================================================
// Upload & documents
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    /// Display name; multiple files are joined with commas.
    pub filename: String,
    pub page_count: usize,
    pub chunks_created: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentEntry {
    pub document_id: String,
    pub filename: String,
    pub vector_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentsListResponse {
    pub documents: Vec<DocumentEntry>,
    pub total: usize,
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub document_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub from_document: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

// ============================================================================
// Quiz
// ============================================================================

fn default_num_questions() -> usize {
    10
}

fn default_num_flashcards() -> usize {
    20
}

fn default_summary_length() -> String {
    "medium".to_string()
}

fn default_session_questions() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub document_id: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: usize,
    pub question_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub quiz: QuizPayload,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateAnswerRequest {
    pub user_answer: String,
    pub correct_answer: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateAnswerResponse {
    pub is_correct: bool,
    pub feedback: String,
}

// ============================================================================
// Summary & flashcards
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub document_id: String,
    #[serde(default = "default_summary_length")]
    pub length: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: SummaryPayload,
}

#[derive(Debug, Deserialize)]
pub struct FlashcardsRequest {
    pub document_id: String,
    #[serde(default = "default_num_flashcards")]
    pub num_flashcards: usize,
}

#[derive(Debug, Serialize)]
pub struct FlashcardsResponse {
    pub flashcards: FlashcardsPayload,
}

// ============================================================================
// Competitive quiz
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateBankRequest {
    pub num_questions: usize,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateBankResponse {
    pub quiz_id: String,
    pub question_bank: Vec<BankQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct CompetitiveStartRequest {
    pub quiz_id: String,
    #[serde(default = "default_session_questions")]
    pub num_questions: usize,
}

#[derive(Debug, Serialize)]
pub struct CompetitiveStartResponse {
    pub session_id: String,
    pub question: BankQuestion,
    pub current_difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct CompetitiveAnswerRequest {
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct CompetitiveAnswerResponse {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub reward: f64,
    pub stats: SessionStats,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_question: Option<BankQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_difficulty: Option<Difficulty>,
}
