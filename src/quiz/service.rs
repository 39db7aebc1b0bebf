//! Competitive Quiz Service
//!
//! Orchestrates bank generation, session startup, and graded turns.
//! Sessions are serialized per `session_id`: a second answer arriving while
//! one is in flight is rejected with a conflict and leaves the session
//! untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AdaptiveConfig;
use crate::error::{AppError, Result};
use crate::generate::ContentGenerator;
use crate::quiz::adaptive::{
    performance_trend, reward, select_next_difficulty, Difficulty,
};
use crate::quiz::bank::{BankQuestion, BankSource, QuestionBank};
use crate::quiz::session::{AnsweredTurn, QuizSession, SessionStats, SessionStore};

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session_id: String,
    pub question: BankQuestion,
    pub current_difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub reward: f64,
    pub stats: SessionStats,
    pub is_complete: bool,
    pub next_question: Option<BankQuestion>,
    pub next_difficulty: Option<Difficulty>,
}

#[derive(Clone)]
pub struct CompetitiveQuizService {
    generator: ContentGenerator,
    banks: Arc<RwLock<HashMap<String, Arc<QuestionBank>>>>,
    sessions: Arc<SessionStore>,
    adaptive: AdaptiveConfig,
}

impl CompetitiveQuizService {
    pub fn new(generator: ContentGenerator, adaptive: AdaptiveConfig) -> Self {
        Self {
            generator,
            banks: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(SessionStore::new()),
            adaptive,
        }
    }

    /// Generate and store a difficulty-stratified question bank.
    pub async fn generate_bank(
        &self,
        num_questions: usize,
        source: BankSource,
    ) -> Result<Arc<QuestionBank>> {
        let items = self
            .generator
            .generate_question_bank(num_questions, &source)
            .await?;

        let bank = Arc::new(QuestionBank {
            quiz_id: Uuid::new_v4().to_string(),
            source,
            items,
        });
        self.banks
            .write()
            .await
            .insert(bank.quiz_id.clone(), bank.clone());

        tracing::info!(
            "Generated question bank {} with {} items",
            bank.quiz_id,
            bank.items.len()
        );
        Ok(bank)
    }

    /// Start a session against an existing bank. Difficulty opens at
    /// medium; the first question is drawn immediately.
    pub async fn start(&self, quiz_id: &str, num_questions: usize) -> Result<StartedSession> {
        let bank = self
            .banks
            .read()
            .await
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Quiz {quiz_id} not found")))?;

        let mut session = QuizSession::new(
            quiz_id,
            num_questions,
            self.adaptive.alpha,
            self.adaptive.gamma,
        );

        let question = {
            let mut rng = rand::thread_rng();
            draw_question(
                &bank,
                session.current_difficulty,
                &session.used_question_ids,
                &mut rng,
            )
            .cloned()
        }
        .ok_or_else(|| AppError::Internal("question bank has no items".to_string()))?;

        session.current_difficulty = question.difficulty;
        session.current_question_id = Some(question.question_id.clone());
        session.used_question_ids.insert(question.question_id.clone());

        let started = StartedSession {
            session_id: session.session_id.clone(),
            current_difficulty: session.current_difficulty,
            question,
        };
        self.sessions.insert(session).await;

        tracing::info!(
            "Started session {} on quiz {quiz_id} (target {num_questions})",
            started.session_id
        );
        Ok(started)
    }

    /// Grade an answer, learn from it, and serve the next question.
    pub async fn answer(
        &self,
        session_id: &str,
        question_id: &str,
        user_answer: &str,
    ) -> Result<AnswerOutcome> {
        let letter = parse_answer_letter(user_answer)?;

        let handle = self
            .sessions
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        let mut session = handle.try_lock().map_err(|_| {
            AppError::Conflict(format!(
                "Session {session_id} is already processing an answer"
            ))
        })?;

        if session.is_complete() {
            return Err(AppError::BadInput(format!(
                "Session {session_id} is already complete"
            )));
        }
        if session.current_question_id.as_deref() != Some(question_id) {
            return Err(AppError::BadInput(format!(
                "Question {question_id} is not the session's current question"
            )));
        }

        let bank = self
            .banks
            .read()
            .await
            .get(&session.quiz_id)
            .cloned()
            .ok_or_else(|| {
                AppError::Internal(format!("Bank {} missing for live session", session.quiz_id))
            })?;
        let question = bank.find(question_id).ok_or_else(|| {
            AppError::Internal(format!("Question {question_id} missing from its bank"))
        })?;

        let served = session.current_difficulty;
        let is_correct = letter == question.correct_answer.trim().to_uppercase();
        let turn_reward = reward(served, is_correct);

        session.answered.push(AnsweredTurn {
            question_id: question_id.to_string(),
            difficulty: served,
            user_answer: user_answer.trim().to_string(),
            is_correct,
            reward: turn_reward,
            answered_at: Utc::now(),
        });

        let next_state = (served, performance_trend(&session.history()));
        let prev_state = session.prev_state;
        session
            .q_learning
            .update(prev_state, served, turn_reward, next_state);
        session.bandit.record(served, is_correct);

        let mut next_question = None;
        let mut next_difficulty = None;

        if session.is_complete() {
            session.current_question_id = None;
        } else {
            let mut rng = rand::thread_rng();
            let selected = select_next_difficulty(
                &session.q_learning,
                &session.bandit,
                next_state,
                served,
                is_correct,
                self.adaptive.epsilon,
                self.adaptive.blend_weight_q,
                &mut rng,
            );
            match draw_question(&bank, selected, &session.used_question_ids, &mut rng).cloned() {
                Some(question) => {
                    session.current_difficulty = question.difficulty;
                    session.prev_state = next_state;
                    session.current_question_id = Some(question.question_id.clone());
                    session.used_question_ids.insert(question.question_id.clone());
                    next_difficulty = Some(question.difficulty);
                    next_question = Some(question);
                }
                None => {
                    // Bank exhausted: close the session at what was answered.
                    tracing::info!(
                        "Session {session_id} exhausted its bank after {} answers",
                        session.answered.len()
                    );
                    session.target_count = session.answered.len();
                    session.current_question_id = None;
                }
            }
        }

        Ok(AnswerOutcome {
            is_correct,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            reward: turn_reward,
            stats: session.stats(),
            is_complete: session.is_complete(),
            next_question,
            next_difficulty,
        })
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> Arc<SessionStore> {
        self.sessions.clone()
    }
}

/// A competitive answer must be a single letter A through D.
fn parse_answer_letter(answer: &str) -> Result<String> {
    let trimmed = answer.trim().to_uppercase();
    if trimmed.len() == 1 && matches!(trimmed.as_str(), "A" | "B" | "C" | "D") {
        Ok(trimmed)
    } else {
        Err(AppError::BadInput(format!(
            "Answer must be a single letter A-D, got \"{answer}\""
        )))
    }
}

/// Draw an unused question at the wanted difficulty, falling back
/// medium → low → hard, then any unused item at all.
fn draw_question<'a, R: Rng + ?Sized>(
    bank: &'a QuestionBank,
    difficulty: Difficulty,
    used: &HashSet<String>,
    rng: &mut R,
) -> Option<&'a BankQuestion> {
    let order = [
        difficulty,
        Difficulty::Medium,
        Difficulty::Low,
        Difficulty::Hard,
    ];
    let mut tried = Vec::with_capacity(order.len());
    for level in order {
        if tried.contains(&level) {
            continue;
        }
        tried.push(level);
        let candidates: Vec<&BankQuestion> = bank
            .items
            .iter()
            .filter(|q| q.difficulty == level && !used.contains(&q.question_id))
            .collect();
        if let Some(question) = candidates.choose(rng).copied() {
            return Some(question);
        }
    }

    let remaining: Vec<&BankQuestion> = bank
        .items
        .iter()
        .filter(|q| !used.contains(&q.question_id))
        .collect();
    remaining.choose(rng).copied()
}
