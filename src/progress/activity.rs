//! Activity sequencing inside a module.
//!
//! Each module runs its activities in a fixed order: matching, word game,
//! simulation, then the quiz. Only the quiz yields a score; the other three are
//! presentation sequencing and have no effect on unlock state.

use serde::{Deserialize, Serialize};

use crate::progress::types::{is_passing, MAX_SCORE};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Matching,
    WordGame,
    Simulation,
    Quiz,
}

impl ActivityKind {
    /// Run order used when a learner plays straight through a module.
    pub const SEQUENCE: [ActivityKind; 4] = [
        ActivityKind::Matching,
        ActivityKind::WordGame,
        ActivityKind::Simulation,
        ActivityKind::Quiz,
    ];

    /// The activity that follows this one, or `None` after the quiz.
    pub fn next(self) -> Option<ActivityKind> {
        match self {
            ActivityKind::Matching => Some(ActivityKind::WordGame),
            ActivityKind::WordGame => Some(ActivityKind::Simulation),
            ActivityKind::Simulation => Some(ActivityKind::Quiz),
            ActivityKind::Quiz => None,
        }
    }

    pub fn is_scored(self) -> bool {
        matches!(self, ActivityKind::Quiz)
    }
}

/// What an activity runner reports when the learner finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityOutcome {
    /// Percentage score from a quiz, clamped to 0..=100.
    Scored(u8),
    /// Unscored game finished.
    Completed,
}

impl ActivityOutcome {
    /// Build the outcome of a finished quiz from its answer tally.
    ///
    /// A quiz with no questions has nothing to record and yields `None`.
    pub fn quiz(correct: u32, total: u32) -> Option<Self> {
        (total > 0).then(|| ActivityOutcome::Scored(quiz_score(correct, total)))
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            ActivityOutcome::Scored(score) => Some((*score).min(MAX_SCORE)),
            ActivityOutcome::Completed => None,
        }
    }

    pub fn passed(&self) -> bool {
        self.score().map(is_passing).unwrap_or(false)
    }
}

/// Percentage of correct answers, rounded to the nearest integer.
///
/// An empty quiz scores 0; `correct` above `total` is capped at 100.
pub fn quiz_score(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total);
    ((correct as f64 / total as f64) * 100.0).round() as u8
}
