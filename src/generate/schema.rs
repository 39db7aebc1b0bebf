//! Generated-Content Schemas
//!
//! Typed payloads for everything the completer is asked to produce, plus
//! the validation applied before any of it reaches a client. Validation
//! errors carry a human-readable reason that is fed back to the model in
//! the repair prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quiz::adaptive::Difficulty;
use crate::quiz::bank::BankQuestion;

pub type ValidationResult<T> = std::result::Result<T, String>;

// ============================================================================
// Quiz
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizItemType {
    MultipleChoice,
    ShortAnswer,
}

impl QuizItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizItemType::MultipleChoice => "multiple_choice",
            QuizItemType::ShortAnswer => "short_answer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizItem {
    pub question_type: QuizItemType,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub hint: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizPayload {
    pub quiz_title: String,
    pub questions: Vec<QuizItem>,
}

/// Validate a quiz payload: item count, per-type field presence, and
/// well-formed lettered options.
pub fn validate_quiz(
    value: Value,
    num_questions: usize,
    requested_types: &[QuizItemType],
) -> ValidationResult<QuizPayload> {
    let payload: QuizPayload =
        serde_json::from_value(value).map_err(|e| format!("quiz payload does not parse: {e}"))?;

    if payload.questions.len() != num_questions {
        return Err(format!(
            "expected {num_questions} questions, got {}",
            payload.questions.len()
        ));
    }

    for (i, item) in payload.questions.iter().enumerate() {
        let n = i + 1;
        if item.question.trim().is_empty() {
            return Err(format!("question {n} has empty text"));
        }
        if item.hint.trim().is_empty() {
            return Err(format!("question {n} has no hint"));
        }
        if item.explanation.trim().is_empty() {
            return Err(format!("question {n} has no explanation"));
        }
        if !requested_types.contains(&item.question_type) {
            return Err(format!(
                "question {n} has unrequested type {}",
                item.question_type.as_str()
            ));
        }
        match item.question_type {
            QuizItemType::MultipleChoice => {
                let options = item
                    .options
                    .as_deref()
                    .ok_or_else(|| format!("multiple-choice question {n} has no options"))?;
                validate_options(options).map_err(|e| format!("question {n}: {e}"))?;
                let answer = item
                    .correct_answer
                    .as_deref()
                    .ok_or_else(|| format!("multiple-choice question {n} has no correct answer"))?;
                validate_answer_letter(answer).map_err(|e| format!("question {n}: {e}"))?;
            }
            QuizItemType::ShortAnswer => {
                if item.options.as_ref().is_some_and(|o| !o.is_empty()) {
                    return Err(format!("short-answer question {n} must not carry options"));
                }
                if item.correct_answer.is_some() {
                    return Err(format!(
                        "short-answer question {n} must not carry a correct_answer"
                    ));
                }
            }
        }
    }

    // Every requested type appears at least once when the count allows it.
    if num_questions >= requested_types.len() {
        for wanted in requested_types {
            if !payload.questions.iter().any(|q| q.question_type == *wanted) {
                return Err(format!("no question of requested type {}", wanted.as_str()));
            }
        }
    }

    Ok(payload)
}

/// Exactly four options prefixed A) through D), in order, non-empty.
fn validate_options(options: &[String]) -> ValidationResult<()> {
    if options.len() != 4 {
        return Err(format!("expected 4 options, got {}", options.len()));
    }
    for (option, expected) in options.iter().zip(['A', 'B', 'C', 'D']) {
        let mut chars = option.trim_start().chars();
        let letter = chars.next().unwrap_or(' ').to_ascii_uppercase();
        let separator = chars.next().unwrap_or(' ');
        if letter != expected || !matches!(separator, ')' | '.' | ':') {
            return Err(format!(
                "option \"{option}\" is not lettered {expected}) …"
            ));
        }
        if chars.as_str().trim().is_empty() {
            return Err(format!("option {expected} has no text"));
        }
    }
    Ok(())
}

fn validate_answer_letter(answer: &str) -> ValidationResult<()> {
    let trimmed = answer.trim().to_uppercase();
    if trimmed.len() == 1 && matches!(trimmed.as_str(), "A" | "B" | "C" | "D") {
        Ok(())
    } else {
        Err(format!("correct answer \"{answer}\" is not a letter A-D"))
    }
}

// ============================================================================
// Competitive question bank
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawBank {
    questions: Vec<RawBankQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawBankQuestion {
    #[serde(default)]
    question_id: Option<String>,
    difficulty: String,
    question: String,
    options: Vec<String>,
    correct_answer: String,
    hint: String,
    explanation: String,
}

/// Validate a bank payload. Missing or duplicate question ids are
/// backfilled positionally; everything else must hold as generated.
pub fn validate_bank(value: Value, num_questions: usize) -> ValidationResult<Vec<BankQuestion>> {
    let raw: RawBank =
        serde_json::from_value(value).map_err(|e| format!("bank payload does not parse: {e}"))?;

    if raw.questions.len() != num_questions {
        return Err(format!(
            "expected {num_questions} questions, got {}",
            raw.questions.len()
        ));
    }

    let mut seen_ids = std::collections::HashSet::new();
    let mut items = Vec::with_capacity(raw.questions.len());
    for (i, q) in raw.questions.into_iter().enumerate() {
        let n = i + 1;
        let difficulty = Difficulty::parse(&q.difficulty)
            .ok_or_else(|| format!("question {n} has unknown difficulty \"{}\"", q.difficulty))?;
        if q.question.trim().is_empty() {
            return Err(format!("question {n} has empty text"));
        }
        if q.hint.trim().is_empty() {
            return Err(format!("question {n} has no hint"));
        }
        if q.explanation.trim().is_empty() {
            return Err(format!("question {n} has no explanation"));
        }
        validate_options(&q.options).map_err(|e| format!("question {n}: {e}"))?;
        validate_answer_letter(&q.correct_answer).map_err(|e| format!("question {n}: {e}"))?;

        let question_id = match q.question_id {
            Some(id) if !id.trim().is_empty() && seen_ids.insert(id.clone()) => id,
            _ => {
                let fallback = format!("q{n}");
                seen_ids.insert(fallback.clone());
                fallback
            }
        };

        items.push(BankQuestion {
            question_id,
            difficulty,
            question: q.question,
            options: q.options,
            correct_answer: q.correct_answer.trim().to_uppercase(),
            hint: q.hint,
            explanation: q.explanation,
        });
    }

    if num_questions >= 3 {
        for difficulty in Difficulty::ALL {
            if !items.iter().any(|q| q.difficulty == difficulty) {
                return Err(format!(
                    "no {} questions in a bank of {num_questions}",
                    difficulty.as_str()
                ));
            }
        }
    }

    Ok(items)
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub summary_title: String,
    pub summary: String,
    pub key_topics: Vec<String>,
    pub word_count: usize,
}

pub fn validate_summary(value: Value) -> ValidationResult<SummaryPayload> {
    let payload: SummaryPayload = serde_json::from_value(value)
        .map_err(|e| format!("summary payload does not parse: {e}"))?;

    if payload.summary_title.trim().is_empty() {
        return Err("summary has no title".to_string());
    }
    if payload.summary.trim().is_empty() {
        return Err("summary text is empty".to_string());
    }
    if payload.key_topics.is_empty() || payload.key_topics.iter().any(|t| t.trim().is_empty()) {
        return Err("key_topics must be a non-empty list of topics".to_string());
    }
    Ok(payload)
}

// ============================================================================
// Flashcards
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardsPayload {
    pub flashcard_set_title: String,
    pub flashcards: Vec<Flashcard>,
}

pub fn validate_flashcards(value: Value, num_flashcards: usize) -> ValidationResult<FlashcardsPayload> {
    let payload: FlashcardsPayload = serde_json::from_value(value)
        .map_err(|e| format!("flashcards payload does not parse: {e}"))?;

    if payload.flashcards.len() != num_flashcards {
        return Err(format!(
            "expected {num_flashcards} flashcards, got {}",
            payload.flashcards.len()
        ));
    }
    for (i, card) in payload.flashcards.iter().enumerate() {
        if card.front.trim().is_empty() || card.back.trim().is_empty() {
            return Err(format!("flashcard {} has an empty side", i + 1));
        }
        if card.category.trim().is_empty() {
            return Err(format!("flashcard {} has no category", i + 1));
        }
    }
    Ok(payload)
}

// ============================================================================
// Short-answer evaluation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationPayload {
    pub is_correct: bool,
    pub feedback: String,
}

pub fn validate_evaluation(value: Value) -> ValidationResult<EvaluationPayload> {
    let payload: EvaluationPayload = serde_json::from_value(value)
        .map_err(|e| format!("evaluation payload does not parse: {e}"))?;
    if payload.feedback.trim().is_empty() {
        return Err("evaluation has no feedback".to_string());
    }
    Ok(payload)
}
