//! Unlock derivation.
//!
//! Unlock flags are never stored. They are recomputed from the catalog and the
//! user's progress records every time, so a catalog reorder or threshold change
//! applies retroactively without a migration.

use std::collections::HashMap;

use crate::progress::catalog::ModuleCatalog;
use crate::progress::types::{ModuleViewState, ProgressRecord};

/// View for a signed-out visitor: first module open, everything else locked, no scores.
pub fn anonymous_view(catalog: &ModuleCatalog) -> Vec<ModuleViewState> {
    catalog
        .iter()
        .enumerate()
        .map(|(index, module)| ModuleViewState {
            id: module.id.clone(),
            order: module.order,
            unlocked: index == 0,
            completed: false,
            score: 0,
        })
        .collect()
}

/// Derive the full view for a signed-in user.
///
/// Module 1 is always unlocked. Module i > 1 is unlocked iff module i-1 has a
/// record with `completed` and a passing score. Missing records read as
/// not completed with score 0. Records for ids outside the catalog are ignored.
pub fn derive_view(
    catalog: &ModuleCatalog,
    records: &HashMap<String, ProgressRecord>,
) -> Vec<ModuleViewState> {
    let mut view = Vec::with_capacity(catalog.len());
    let mut previous_unlocks_next = true;

    for module in catalog.iter() {
        let record = records.get(&module.id);
        view.push(ModuleViewState {
            id: module.id.clone(),
            order: module.order,
            unlocked: previous_unlocks_next,
            completed: record.map(|r| r.completed).unwrap_or(false),
            score: record.map(|r| r.score).unwrap_or(0),
        });
        previous_unlocks_next = record.map(|r| r.unlocks_successor()).unwrap_or(false);
    }

    view
}

/// Index records by module id. A later record for the same module replaces an earlier one.
pub fn index_records(records: Vec<ProgressRecord>) -> HashMap<String, ProgressRecord> {
    let mut indexed = HashMap::with_capacity(records.len());
    for record in records {
        indexed.insert(record.module_id.clone(), record);
    }
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::types::ModuleDefinition;
    use chrono::Utc;

    fn abc() -> ModuleCatalog {
        ModuleCatalog::new(vec![
            ModuleDefinition::new("a", 1),
            ModuleDefinition::new("b", 2),
            ModuleDefinition::new("c", 3),
        ])
        .unwrap()
    }

    fn records(entries: &[(&str, bool, u8)]) -> HashMap<String, ProgressRecord> {
        index_records(
            entries
                .iter()
                .map(|(id, completed, score)| {
                    let mut rec = ProgressRecord::attempt(id, *score, Utc::now());
                    rec.completed = *completed;
                    rec
                })
                .collect(),
        )
    }

    fn unlocked(view: &[ModuleViewState]) -> Vec<bool> {
        view.iter().map(|m| m.unlocked).collect()
    }

    #[test]
    fn anonymous_view_opens_only_first_module() {
        for size in 1..=6u32 {
            let defs = (1..=size)
                .map(|n| ModuleDefinition::new(&format!("m{}", n), n))
                .collect();
            let catalog = ModuleCatalog::new(defs).unwrap();
            let view = anonymous_view(&catalog);
            assert_eq!(view.len(), size as usize);
            assert_eq!(view.iter().filter(|m| m.unlocked).count(), 1);
            assert!(view[0].unlocked);
            assert!(view.iter().all(|m| !m.completed && m.score == 0));
        }
    }

    #[test]
    fn missing_records_leave_successors_locked() {
        let view = derive_view(&abc(), &HashMap::new());
        assert_eq!(unlocked(&view), [true, false, false]);
    }

    #[test]
    fn unlock_requires_completed_and_passing_predecessor() {
        let view = derive_view(&abc(), &records(&[("a", true, 60)]));
        assert_eq!(unlocked(&view), [true, true, false]);

        let view = derive_view(&abc(), &records(&[("a", true, 59)]));
        assert_eq!(unlocked(&view), [true, false, false]);

        let view = derive_view(&abc(), &records(&[("a", false, 100)]));
        assert_eq!(unlocked(&view), [true, false, false]);
    }

    #[test]
    fn derivation_does_not_require_contiguous_history() {
        // b passed without a record for a: c opens, b itself stays locked.
        let view = derive_view(&abc(), &records(&[("b", true, 90)]));
        assert_eq!(unlocked(&view), [true, false, true]);
        assert!(view[1].completed);
    }

    #[test]
    fn unknown_records_are_ignored() {
        let view = derive_view(&abc(), &records(&[("zzz", true, 100)]));
        assert_eq!(unlocked(&view), [true, false, false]);
    }
}
