//! Adaptive Difficulty Selection
//!
//! A tabular Q-learning agent blended with Thompson-sampling bandits picks
//! the next question's difficulty. The Q-policy leans on what the session
//! has learned; the Thompson policy keeps exploring; a final safety
//! adjustment keeps the difficulty from moving against the most recent
//! outcome.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Low, Difficulty::Medium, Difficulty::Hard];

    /// Tie-break order for the greedy policy.
    const GREEDY_ORDER: [Difficulty; 3] = [Difficulty::Medium, Difficulty::Low, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Difficulty> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Difficulty::Low),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    fn level(&self) -> u8 {
        match self {
            Difficulty::Low => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        }
    }
}

/// Q-learning state: the difficulty just served and the recent trend.
pub type State = (Difficulty, Trend);

/// Trend over the last up-to-3 answers: two or more correct is improving,
/// two or more incorrect is declining, anything else (including fewer than
/// two answers) is stable.
pub fn performance_trend(history: &[bool]) -> Trend {
    let window: Vec<bool> = history.iter().rev().take(3).copied().collect();
    if window.len() < 2 {
        return Trend::Stable;
    }
    let correct = window.iter().filter(|c| **c).count();
    let incorrect = window.len() - correct;
    if correct >= 2 {
        Trend::Improving
    } else if incorrect >= 2 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Reward for a graded answer: harder questions pay more when right and
/// cost more when wrong.
pub fn reward(difficulty: Difficulty, is_correct: bool) -> f64 {
    match (difficulty, is_correct) {
        (Difficulty::Low, true) => 0.50,
        (Difficulty::Low, false) => -0.50,
        (Difficulty::Medium, true) => 0.75,
        (Difficulty::Medium, false) => -0.55,
        (Difficulty::Hard, true) => 1.00,
        (Difficulty::Hard, false) => -0.75,
    }
}

// ============================================================================
// Q-learning
// ============================================================================

/// Sparse tabular Q-learning over the nine (difficulty, trend) states.
/// Unknown entries read as zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QLearning {
    alpha: f64,
    gamma: f64,
    table: HashMap<State, HashMap<Difficulty, f64>>,
}

impl QLearning {
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self {
            alpha,
            gamma,
            table: HashMap::new(),
        }
    }

    pub fn q(&self, state: State, action: Difficulty) -> f64 {
        self.table
            .get(&state)
            .and_then(|actions| actions.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Best action value in a state; unknown entries read as zero.
    pub fn max_q(&self, state: State) -> f64 {
        Difficulty::ALL
            .iter()
            .map(|a| self.q(state, *a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// `Q(s,a) += α · (r + γ · max_a' Q(s',a') − Q(s,a))`.
    pub fn update(&mut self, state: State, action: Difficulty, reward: f64, next_state: State) {
        let current = self.q(state, action);
        let updated =
            current + self.alpha * (reward + self.gamma * self.max_q(next_state) - current);
        self.table.entry(state).or_default().insert(action, updated);
    }

    /// ε-greedy recommendation: explore uniformly with probability ε,
    /// otherwise take the argmax with ties broken medium > low > hard.
    pub fn recommend<R: Rng + ?Sized>(&self, state: State, epsilon: f64, rng: &mut R) -> Difficulty {
        if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
            return Difficulty::ALL[rng.gen_range(0..Difficulty::ALL.len())];
        }
        let mut best = Difficulty::GREEDY_ORDER[0];
        let mut best_q = self.q(state, best);
        for action in &Difficulty::GREEDY_ORDER[1..] {
            let value = self.q(state, *action);
            if value > best_q {
                best = *action;
                best_q = value;
            }
        }
        best
    }

    pub fn table(&self) -> &HashMap<State, HashMap<Difficulty, f64>> {
        &self.table
    }
}

// ============================================================================
// Thompson sampling
// ============================================================================

/// Per-difficulty Beta bandit. Every graded answer tightens the posterior
/// for the difficulty that was served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThompsonSampler {
    params: HashMap<Difficulty, (f64, f64)>,
}

impl ThompsonSampler {
    pub fn new() -> Self {
        let params = Difficulty::ALL.iter().map(|d| (*d, (1.0, 1.0))).collect();
        Self { params }
    }

    /// Sample θ ~ Beta(α, β) per difficulty and take the argmax.
    pub fn recommend<R: Rng + ?Sized>(&self, rng: &mut R) -> Difficulty {
        let mut best = Difficulty::ALL[0];
        let mut best_sample = f64::NEG_INFINITY;
        for difficulty in Difficulty::ALL {
            let (alpha, beta) = self.params(difficulty);
            let sample = match Beta::new(alpha, beta) {
                Ok(dist) => dist.sample(rng),
                Err(_) => 0.5,
            };
            if sample > best_sample {
                best = difficulty;
                best_sample = sample;
            }
        }
        best
    }

    pub fn record(&mut self, difficulty: Difficulty, is_correct: bool) {
        let entry = self.params.entry(difficulty).or_insert((1.0, 1.0));
        if is_correct {
            entry.0 += 1.0;
        } else {
            entry.1 += 1.0;
        }
    }

    pub fn params(&self, difficulty: Difficulty) -> (f64, f64) {
        self.params.get(&difficulty).copied().unwrap_or((1.0, 1.0))
    }
}

impl Default for ThompsonSampler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Blended selection
// ============================================================================

/// Pick the next difficulty: draw one recommendation from each policy,
/// keep the Q-policy's with probability `blend_weight_q`, then apply the
/// safety adjustment against the most recent outcome.
pub fn select_next_difficulty<R: Rng + ?Sized>(
    q_learning: &QLearning,
    bandit: &ThompsonSampler,
    state: State,
    current: Difficulty,
    last_correct: bool,
    epsilon: f64,
    blend_weight_q: f64,
    rng: &mut R,
) -> Difficulty {
    let q_pick = q_learning.recommend(state, epsilon, rng);
    let thompson_pick = bandit.recommend(rng);
    let blended = if rng.gen_bool(blend_weight_q.clamp(0.0, 1.0)) {
        q_pick
    } else {
        thompson_pick
    };

    // A correct answer never eases below the current difficulty; a miss
    // never escalates above it.
    if last_correct && blended.level() < current.level() {
        current
    } else if !last_correct && blended.level() > current.level() {
        current
    } else {
        blended
    }
}
