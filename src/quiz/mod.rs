//! Adaptive Quiz Engine
//!
//! Question banks, per-session state, and the Q-learning + Thompson
//! sampling difficulty selector behind the competitive quiz.

pub mod adaptive;
pub mod bank;
pub mod service;
pub mod session;

pub use adaptive::{Difficulty, Trend};
pub use bank::{BankQuestion, BankSource, QuestionBank};
pub use service::{AnswerOutcome, CompetitiveQuizService, StartedSession};
pub use session::{QuizSession, SessionStats, SessionStore};
