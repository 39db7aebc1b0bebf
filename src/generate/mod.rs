//! Content Generators
//!
//! Quiz, summary, flashcard, short-answer-evaluation, and competitive
//! question-bank generation. Every generator retrieves context for breadth
//! (top-by-similarity, re-sorted into narrative order), prompts for strict
//! JSON, validates the result against its schema, and retries exactly once
//! with a repair instruction before giving up.

pub mod schema;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::providers::CompletionProvider;
use crate::quiz::bank::{BankQuestion, BankSource};
use crate::retrieval::RetrievalService;
use schema::{
    validate_bank, validate_evaluation, validate_flashcards, validate_quiz, validate_summary,
    EvaluationPayload, FlashcardsPayload, QuizItemType, QuizPayload, SummaryPayload,
};

/// Context breadth per generator, within the 8..=12 band.
const QUIZ_CONTEXT_K: usize = 10;
const BANK_CONTEXT_K: usize = 12;
const SUMMARY_CONTEXT_K: usize = 12;
const FLASHCARD_CONTEXT_K: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "short" => Some(SummaryLength::Short),
            "medium" => Some(SummaryLength::Medium),
            "long" => Some(SummaryLength::Long),
            _ => None,
        }
    }

    fn word_target(&self) -> usize {
        match self {
            SummaryLength::Short => 200,
            SummaryLength::Medium => 400,
            SummaryLength::Long => 800,
        }
    }
}

#[derive(Clone)]
pub struct ContentGenerator {
    retrieval: RetrievalService,
    completer: Arc<dyn CompletionProvider>,
}

impl ContentGenerator {
    pub fn new(retrieval: RetrievalService, completer: Arc<dyn CompletionProvider>) -> Self {
        Self {
            retrieval,
            completer,
        }
    }

    /// Retrieve broadly and stitch the winners back into document order,
    /// which reads better as generation context than similarity order.
    async fn breadth_context(&self, document_id: &str, query: &str, k: usize) -> Result<String> {
        let mut chunks = self.retrieval.retrieve(document_id, query, k).await?;
        if chunks.is_empty() {
            return Err(AppError::NotFound(format!(
                "Document {document_id} has no indexed content"
            )));
        }
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Complete, validate, and retry once with a repair instruction.
    async fn complete_validated<T>(
        &self,
        prompt: &str,
        validate: impl Fn(Value) -> std::result::Result<T, String>,
    ) -> Result<T> {
        let raw = self.completer.complete(prompt).await?;
        let first_failure = match extract_json(&raw).and_then(&validate) {
            Ok(parsed) => return Ok(parsed),
            Err(reason) => reason,
        };

        tracing::warn!("Generated output failed validation, retrying once: {first_failure}");
        let repair = format!(
            "{prompt}\n\nYour previous response was rejected: {first_failure}. Respond again \
             with corrected, valid JSON only, no surrounding text."
        );
        let raw = self.completer.complete(&repair).await?;
        extract_json(&raw).and_then(&validate).map_err(|reason| {
            AppError::Generation(format!("Model output failed validation twice: {reason}"))
        })
    }

    // ------------------------------------------------------------------
    // Quiz
    // ------------------------------------------------------------------

    pub async fn generate_quiz(
        &self,
        document_id: &str,
        num_questions: usize,
        types: &[QuizItemType],
    ) -> Result<QuizPayload> {
        let context = self
            .breadth_context(
                document_id,
                "key concepts important topics main ideas",
                QUIZ_CONTEXT_K,
            )
            .await?;

        let type_list = types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = format!(
            "Generate a quiz from the following study material.\n\n\
             Material:\n{context}\n\n\
             Requirements:\n\
             - Generate exactly {num_questions} questions\n\
             - Question types to include: {type_list}; use at least one of each\n\
             - Every question must be self-contained: carry enough context in the question \
             text to answer it without re-reading the source\n\
             - Multiple-choice questions carry exactly four options lettered A) to D) and a \
             single correct letter; short-answer questions carry neither options nor a \
             correct_answer field\n\
             - Every question carries a hint that points toward the answer without revealing \
             it, and a short explanation\n\n\
             Respond with only a JSON object of this shape:\n\
             {{\n  \"quiz_title\": \"...\",\n  \"questions\": [\n    {{\"question_type\": \
             \"multiple_choice\", \"question\": \"...\", \"options\": [\"A) ...\", \"B) ...\", \
             \"C) ...\", \"D) ...\"], \"correct_answer\": \"A\", \"hint\": \"...\", \
             \"explanation\": \"...\"}},\n    {{\"question_type\": \"short_answer\", \
             \"question\": \"...\", \"hint\": \"...\", \"explanation\": \"...\"}}\n  ]\n}}"
        );

        self.complete_validated(&prompt, |v| validate_quiz(v, num_questions, types))
            .await
    }

    // ------------------------------------------------------------------
    // Competitive question bank
    // ------------------------------------------------------------------

    pub async fn generate_question_bank(
        &self,
        num_questions: usize,
        source: &BankSource,
    ) -> Result<Vec<BankQuestion>> {
        let context = match source {
            BankSource::Document(document_id) => {
                self.breadth_context(
                    document_id,
                    "key concepts important topics diverse content",
                    BANK_CONTEXT_K,
                )
                .await?
            }
            BankSource::Topic(topic) => format!("The quiz topic is: {topic}"),
        };

        let (low, medium, hard) = difficulty_counts(num_questions);
        let prompt = format!(
            "Generate a question bank for an adaptive quiz from the following material.\n\n\
             Material:\n{context}\n\n\
             Requirements:\n\
             - Generate exactly {num_questions} multiple-choice questions, each with four \
             options lettered A) to D) and one correct letter\n\
             - Low-difficulty questions: {low} (recall and straightforward facts)\n\
             - Medium-difficulty questions: {medium} (application of concepts)\n\
             - Hard-difficulty questions: {hard} (analysis and synthesis)\n\
             - Every question is self-contained and carries a hint and an explanation\n\n\
             Respond with only a JSON object of this shape:\n\
             {{\n  \"questions\": [\n    {{\"question_id\": \"q1\", \"difficulty\": \"low\", \
             \"question\": \"...\", \"options\": [\"A) ...\", \"B) ...\", \"C) ...\", \
             \"D) ...\"], \"correct_answer\": \"A\", \"hint\": \"...\", \"explanation\": \
             \"...\"}}\n  ]\n}}"
        );

        self.complete_validated(&prompt, |v| validate_bank(v, num_questions))
            .await
    }

    // ------------------------------------------------------------------
    // Summary
    // ------------------------------------------------------------------

    pub async fn generate_summary(
        &self,
        document_id: &str,
        length: SummaryLength,
    ) -> Result<SummaryPayload> {
        let context = self
            .breadth_context(
                document_id,
                "main topics key points summary overview",
                SUMMARY_CONTEXT_K,
            )
            .await?;

        let words = length.word_target();
        let prompt = format!(
            "Summarize the following study material.\n\n\
             Material:\n{context}\n\n\
             Requirements:\n\
             - Target approximately {words} words (within thirty percent either way)\n\
             - Capture the main ideas and key concepts in clear academic language\n\
             - List the key topics covered\n\n\
             Respond with only a JSON object of this shape:\n\
             {{\"summary_title\": \"...\", \"summary\": \"...\", \"key_topics\": [\"...\"], \
             \"word_count\": {words}}}"
        );

        self.complete_validated(&prompt, validate_summary).await
    }

    // ------------------------------------------------------------------
    // Flashcards
    // ------------------------------------------------------------------

    pub async fn generate_flashcards(
        &self,
        document_id: &str,
        num_flashcards: usize,
    ) -> Result<FlashcardsPayload> {
        let context = self
            .breadth_context(
                document_id,
                "definitions concepts terms key vocabulary important facts",
                FLASHCARD_CONTEXT_K,
            )
            .await?;

        let prompt = format!(
            "Generate flashcards from the following study material.\n\n\
             Material:\n{context}\n\n\
             Requirements:\n\
             - Generate exactly {num_flashcards} flashcards\n\
             - Each front is a question or term, each back a clear answer or definition, and \
             each card names a category\n\n\
             Respond with only a JSON object of this shape:\n\
             {{\"flashcard_set_title\": \"...\", \"flashcards\": [{{\"front\": \"...\", \
             \"back\": \"...\", \"category\": \"...\"}}]}}"
        );

        self.complete_validated(&prompt, |v| validate_flashcards(v, num_flashcards))
            .await
    }

    // ------------------------------------------------------------------
    // Short-answer evaluation
    // ------------------------------------------------------------------

    /// Semantic grading of a free-text answer. Pure in its inputs: the same
    /// triple always produces the same completion call.
    pub async fn evaluate_answer(
        &self,
        user_answer: &str,
        correct_answer: &str,
        question: &str,
    ) -> Result<EvaluationPayload> {
        let prompt = format!(
            "Evaluate whether the student's answer matches the expected answer.\n\n\
             Question: {question}\n\
             Correct answer: {correct_answer}\n\
             Student's answer: {user_answer}\n\n\
             Judge by meaning, not wording: synonyms and paraphrases count as correct, and \
             numeric answers must match to the precision the question implies.\n\n\
             Respond with only a JSON object of this shape:\n\
             {{\"is_correct\": true, \"feedback\": \"...\"}}"
        );

        self.complete_validated(&prompt, validate_evaluation).await
    }
}

/// Split a bank size into per-difficulty counts, spreading the remainder
/// from low upward.
fn difficulty_counts(num: usize) -> (usize, usize, usize) {
    let base = num / 3;
    let rem = num % 3;
    (
        base + usize::from(rem >= 1),
        base + usize::from(rem >= 2),
        base,
    )
}

/// Pull the JSON object out of a completion, tolerating a Markdown code
/// fence around it.
fn extract_json(raw: &str) -> std::result::Result<Value, String> {
    let trimmed = raw.trim();
    let body = if let Some(after_fence) = trimmed.strip_prefix("```") {
        let after_tag = after_fence.strip_prefix("json").unwrap_or(after_fence);
        let end = after_tag.rfind("```").unwrap_or(after_tag.len());
        after_tag[..end].trim()
    } else {
        trimmed
    };
    serde_json::from_str(body).map_err(|e| format!("response is not valid JSON: {e}"))
}
