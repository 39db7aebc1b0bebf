//! Question Banks
//!
//! A bank is a pre-generated, difficulty-stratified pool of multiple-choice
//! items. Banks are independent of the document or topic they were drawn
//! from and may back any number of sessions.

use serde::{Deserialize, Serialize};

use super::adaptive::Difficulty;

/// What a bank was generated from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BankSource {
    Document(String),
    Topic(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankQuestion {
    pub question_id: String,
    pub difficulty: Difficulty,
    pub question: String,
    /// Exactly four options, lettered A through D.
    pub options: Vec<String>,
    /// The correct option's letter.
    pub correct_answer: String,
    pub hint: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionBank {
    pub quiz_id: String,
    pub source: BankSource,
    pub items: Vec<BankQuestion>,
}

impl QuestionBank {
    pub fn find(&self, question_id: &str) -> Option<&BankQuestion> {
        self.items.iter().find(|q| q.question_id == question_id)
    }
}
