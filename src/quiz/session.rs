//! Quiz Sessions
//!
//! Per-session state for the adaptive quiz: history, Q-table, bandit
//! parameters, and the bookkeeping that enforces no-repetition. Sessions
//! live in memory behind a store that serializes turns per session while
//! letting unrelated sessions proceed concurrently.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::adaptive::{
    performance_trend, Difficulty, QLearning, State, ThompsonSampler, Trend,
};

/// One graded turn.
#[derive(Debug, Clone, Serialize)]
pub struct AnsweredTurn {
    pub question_id: String,
    pub difficulty: Difficulty,
    pub user_answer: String,
    pub is_correct: bool,
    pub reward: f64,
    pub answered_at: DateTime<Utc>,
}

/// Stats reported after every answer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub questions_answered: usize,
    pub correct_answers: usize,
    /// Percentage in [0, 100].
    pub accuracy: f64,
    pub total_reward: f64,
    pub performance_trend: Trend,
    pub difficulty_distribution: BTreeMap<&'static str, usize>,
}

#[derive(Debug)]
pub struct QuizSession {
    pub session_id: String,
    pub quiz_id: String,
    pub target_count: usize,
    pub answered: Vec<AnsweredTurn>,
    pub q_learning: QLearning,
    pub bandit: ThompsonSampler,
    /// The difficulty the next served question must match.
    pub current_difficulty: Difficulty,
    pub current_question_id: Option<String>,
    pub used_question_ids: HashSet<String>,
    /// State in effect when the current question's difficulty was chosen.
    pub prev_state: State,
}

impl QuizSession {
    pub fn new(quiz_id: &str, target_count: usize, alpha: f64, gamma: f64) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            quiz_id: quiz_id.to_string(),
            target_count,
            answered: Vec::new(),
            q_learning: QLearning::new(alpha, gamma),
            bandit: ThompsonSampler::new(),
            current_difficulty: Difficulty::Medium,
            current_question_id: None,
            used_question_ids: HashSet::new(),
            prev_state: (Difficulty::Medium, Trend::Stable),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answered.len() >= self.target_count
    }

    pub fn history(&self) -> Vec<bool> {
        self.answered.iter().map(|t| t.is_correct).collect()
    }

    pub fn stats(&self) -> SessionStats {
        let answered = self.answered.len();
        let correct = self.answered.iter().filter(|t| t.is_correct).count();
        let accuracy = if answered > 0 {
            (correct as f64 / answered as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        let mut distribution: BTreeMap<&'static str, usize> = BTreeMap::new();
        for turn in &self.answered {
            *distribution.entry(turn.difficulty.as_str()).or_default() += 1;
        }

        SessionStats {
            questions_answered: answered,
            correct_answers: correct,
            accuracy,
            total_reward: self.answered.iter().map(|t| t.reward).sum(),
            performance_trend: performance_trend(&self.history()),
            difficulty_distribution: distribution,
        }
    }
}

/// In-memory session store. Lookups are concurrent; each session is
/// guarded by its own lock, acquired with `try_lock` so a second answer
/// for the same session fails fast instead of queueing.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Arc<Mutex<QuizSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: QuizSession) {
        self.inner
            .write()
            .await
            .insert(session.session_id.clone(), Arc::new(Mutex::new(session)));
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<QuizSession>>> {
        self.inner.read().await.get(session_id).cloned()
    }
}
