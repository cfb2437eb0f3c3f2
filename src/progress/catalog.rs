//! The ordered, immutable list of learning modules.

use std::collections::HashSet;

use crate::progress::errors::ProgressError;
use crate::progress::types::ModuleDefinition;
use crate::validation::is_valid_module_slug;

/// Module ids of the built-in program, in learning order.
pub const STANDARD_MODULE_IDS: &[&str] = &[
    "what-is-hiv-aids",
    "hiv-aids-prevention",
    "symptoms-and-treatment",
    "stigma-and-discrimination",
    "healthy-relationships",
];

/// Ordered module definitions, validated once at construction.
///
/// Invariants: at least one module, unique ids, and `order` values exactly `1..=len`.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDefinition>,
}

impl ModuleCatalog {
    /// Build a catalog from definitions supplied in any order.
    pub fn new(mut modules: Vec<ModuleDefinition>) -> Result<Self, ProgressError> {
        if modules.is_empty() {
            return Err(ProgressError::InvalidCatalog(
                "catalog must contain at least one module".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for module in &modules {
            if !is_valid_module_slug(&module.id) {
                return Err(ProgressError::InvalidCatalog(format!(
                    "module id '{}' is not a lowercase slug",
                    module.id
                )));
            }
            if !seen.insert(module.id.as_str()) {
                return Err(ProgressError::InvalidCatalog(format!(
                    "duplicate module id '{}'",
                    module.id
                )));
            }
        }

        modules.sort_by_key(|m| m.order);
        for (index, module) in modules.iter().enumerate() {
            let expected = index as u32 + 1;
            if module.order != expected {
                return Err(ProgressError::InvalidCatalog(format!(
                    "module '{}' has order {}, expected {} (orders must be contiguous from 1)",
                    module.id, module.order, expected
                )));
            }
        }

        Ok(Self { modules })
    }

    /// The five-module HIV/AIDS awareness program.
    pub fn standard() -> Self {
        let icons = ["info", "shield", "stethoscope", "users", "heart"];
        let modules = STANDARD_MODULE_IDS
            .iter()
            .zip(icons)
            .enumerate()
            .map(|(index, (id, icon))| ModuleDefinition::new(id, index as u32 + 1).with_icon(icon))
            .collect();
        Self { modules }
    }

    /// All modules in learning order.
    pub fn list(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, module_id: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.get(module_id).is_some()
    }

    /// Zero-based index of `module_id` in learning order.
    pub fn position(&self, module_id: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.id == module_id)
    }

    pub fn successor(&self, module_id: &str) -> Option<&ModuleDefinition> {
        self.position(module_id)
            .and_then(|index| self.modules.get(index + 1))
    }

    pub fn predecessor(&self, module_id: &str) -> Option<&ModuleDefinition> {
        match self.position(module_id) {
            Some(index) if index > 0 => self.modules.get(index - 1),
            _ => None,
        }
    }

    /// Returns the definition or `InvalidModuleId`.
    pub fn require(&self, module_id: &str) -> Result<&ModuleDefinition, ProgressError> {
        self.get(module_id)
            .ok_or_else(|| ProgressError::InvalidModuleId(module_id.to_string()))
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_valid() {
        let catalog = ModuleCatalog::standard();
        let rebuilt = ModuleCatalog::new(catalog.list().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), 5);
        assert_eq!(rebuilt.list()[0].id, "what-is-hiv-aids");
        assert_eq!(rebuilt.list()[4].order, 5);
        assert_eq!(rebuilt.list()[1].icon, "shield");
        assert_eq!(rebuilt.list()[2].title_key, "module3.title");
    }

    #[test]
    fn definitions_are_sorted_by_order() {
        let catalog = ModuleCatalog::new(vec![
            ModuleDefinition::new("c", 3),
            ModuleDefinition::new("a", 1),
            ModuleDefinition::new("b", 2),
        ])
        .unwrap();
        let ids: Vec<_> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(catalog.successor("a").map(|m| m.id.as_str()), Some("b"));
        assert!(catalog.successor("c").is_none());
        assert_eq!(catalog.predecessor("c").map(|m| m.id.as_str()), Some("b"));
        assert!(catalog.predecessor("a").is_none());
        assert!(catalog.predecessor("zzz").is_none());
    }

    #[test]
    fn rejects_gaps_duplicates_and_empty() {
        assert!(ModuleCatalog::new(vec![]).is_err());
        assert!(ModuleCatalog::new(vec![
            ModuleDefinition::new("a", 1),
            ModuleDefinition::new("b", 3),
        ])
        .is_err());
        assert!(ModuleCatalog::new(vec![
            ModuleDefinition::new("a", 1),
            ModuleDefinition::new("a", 2),
        ])
        .is_err());
        assert!(ModuleCatalog::new(vec![
            ModuleDefinition::new("a", 1),
            ModuleDefinition::new("b", 1),
        ])
        .is_err());
        assert!(ModuleCatalog::new(vec![ModuleDefinition::new("a", 0)]).is_err());
        assert!(ModuleCatalog::new(vec![ModuleDefinition::new("Bad Id", 1)]).is_err());
    }

    #[test]
    fn require_reports_unknown_ids() {
        let catalog = ModuleCatalog::standard();
        assert!(catalog.require("hiv-aids-prevention").is_ok());
        assert!(matches!(
            catalog.require("missing"),
            Err(ProgressError::InvalidModuleId(id)) if id == "missing"
        ));
    }
}
