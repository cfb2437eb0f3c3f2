use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum quiz score (percent) a module must reach before its successor unlocks.
///
/// Shared by the engine and by any activity that displays the requirement.
pub const PASS_THRESHOLD: u8 = 60;

/// Highest score an attempt can record.
pub const MAX_SCORE: u8 = 100;

pub const PROGRESS_SCHEMA_VERSION: u8 = 1;

/// Returns true when `score` clears [`PASS_THRESHOLD`].
pub fn is_passing(score: u8) -> bool {
    score >= PASS_THRESHOLD
}

/// Static description of a learning module. Owned by the catalog and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleDefinition {
    pub id: String,
    /// 1-based position in the learning sequence.
    pub order: u32,
    /// Translation key for the title; rendered by the presentation layer.
    pub title_key: String,
    pub description_key: String,
    #[serde(default)]
    pub icon: String,
}

impl ModuleDefinition {
    pub fn new(id: &str, order: u32) -> Self {
        Self {
            id: id.to_string(),
            order,
            title_key: format!("module{}.title", order),
            description_key: format!("module{}.description", order),
            icon: String::new(),
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }
}

/// Stored result of the latest attempt at a module, one per (user, module).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressRecord {
    pub module_id: String,
    pub completed: bool,
    pub score: u8,
    pub last_attempt_date: DateTime<Utc>,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

fn default_schema_version() -> u8 {
    PROGRESS_SCHEMA_VERSION
}

impl ProgressRecord {
    /// Record for an attempt that just finished. Any attempt marks the module completed.
    pub fn attempt(module_id: &str, score: u8, at: DateTime<Utc>) -> Self {
        Self {
            module_id: module_id.to_string(),
            completed: true,
            score,
            last_attempt_date: at,
            schema_version: PROGRESS_SCHEMA_VERSION,
        }
    }

    /// True when this record satisfies the unlock rule for the next module.
    pub fn unlocks_successor(&self) -> bool {
        self.completed && is_passing(self.score)
    }
}

/// Per-module, per-user position in the Locked → Unlocked → Attempted → Passed machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStage {
    Locked,
    Unlocked,
    /// Completed with a score below the pass threshold.
    Attempted,
    Passed,
}

impl ModuleStage {
    pub fn label(&self) -> &'static str {
        match self {
            ModuleStage::Locked => "locked",
            ModuleStage::Unlocked => "unlocked",
            ModuleStage::Attempted => "attempted",
            ModuleStage::Passed => "passed",
        }
    }
}

/// Derived view of a module for the current session. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleViewState {
    pub id: String,
    pub order: u32,
    pub unlocked: bool,
    pub completed: bool,
    pub score: u8,
}

impl ModuleViewState {
    pub fn stage(&self) -> ModuleStage {
        if self.completed {
            if is_passing(self.score) {
                ModuleStage::Passed
            } else {
                ModuleStage::Attempted
            }
        } else if self.unlocked {
            ModuleStage::Unlocked
        } else {
            ModuleStage::Locked
        }
    }
}

/// Dashboard-level aggregate over a derived view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total: usize,
    pub completed: usize,
    pub passed: usize,
    /// round(completed / total * 100)
    pub percent_complete: u8,
    /// First module that is unlocked but not yet completed.
    pub next_module: Option<String>,
}

impl ProgressSummary {
    pub fn from_view(view: &[ModuleViewState]) -> Self {
        let total = view.len();
        let completed = view.iter().filter(|m| m.completed).count();
        let passed = view
            .iter()
            .filter(|m| m.stage() == ModuleStage::Passed)
            .count();
        let percent_complete = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        let next_module = view
            .iter()
            .find(|m| m.unlocked && !m.completed)
            .map(|m| m.id.clone());
        Self {
            total,
            completed,
            passed,
            percent_complete,
            next_module,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str, order: u32, unlocked: bool, completed: bool, score: u8) -> ModuleViewState {
        ModuleViewState {
            id: id.to_string(),
            order,
            unlocked,
            completed,
            score,
        }
    }

    #[test]
    fn stage_follows_completion_and_score() {
        assert_eq!(view("a", 1, false, false, 0).stage(), ModuleStage::Locked);
        assert_eq!(view("a", 1, true, false, 0).stage(), ModuleStage::Unlocked);
        assert_eq!(view("a", 1, true, true, 59).stage(), ModuleStage::Attempted);
        assert_eq!(view("a", 1, true, true, 60).stage(), ModuleStage::Passed);
    }

    #[test]
    fn attempt_record_is_always_completed() {
        let rec = ProgressRecord::attempt("a", 10, Utc::now());
        assert!(rec.completed);
        assert!(!rec.unlocks_successor());
        assert!(ProgressRecord::attempt("a", PASS_THRESHOLD, Utc::now()).unlocks_successor());
    }

    #[test]
    fn summary_rounds_percent_and_finds_next() {
        let modules = vec![
            view("a", 1, true, true, 80),
            view("b", 2, true, true, 30),
            view("c", 3, false, false, 0),
        ];
        let summary = ProgressSummary::from_view(&modules);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.percent_complete, 67);
        assert_eq!(summary.next_module, None);

        let fresh = vec![view("a", 1, true, false, 0), view("b", 2, false, false, 0)];
        let summary = ProgressSummary::from_view(&fresh);
        assert_eq!(summary.percent_complete, 0);
        assert_eq!(summary.next_module.as_deref(), Some("a"));
    }
}
