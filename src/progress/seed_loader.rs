//! Catalog seed loading from JSON.
//!
//! Lets operators reorder or extend the module list without recompiling. The file
//! is a JSON array of module definitions:
//!
//! ```json
//! [
//!   { "id": "what-is-hiv-aids", "order": 1, "title_key": "module1.title",
//!     "description_key": "module1.description", "icon": "info" }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::progress::catalog::ModuleCatalog;
use crate::progress::errors::ProgressError;
use crate::progress::types::ModuleDefinition;

#[derive(Debug, Deserialize)]
struct ModuleSeed {
    id: String,
    order: u32,
    #[serde(default)]
    title_key: Option<String>,
    #[serde(default)]
    description_key: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

impl From<ModuleSeed> for ModuleDefinition {
    fn from(seed: ModuleSeed) -> Self {
        let mut module = ModuleDefinition::new(&seed.id, seed.order);
        if let Some(title_key) = seed.title_key {
            module.title_key = title_key;
        }
        if let Some(description_key) = seed.description_key {
            module.description_key = description_key;
        }
        if let Some(icon) = seed.icon {
            module.icon = icon;
        }
        module
    }
}

/// Parse a catalog from a JSON string. Missing display keys default to `module<N>.*`.
pub fn parse_catalog_json(contents: &str) -> Result<ModuleCatalog, ProgressError> {
    let seeds: Vec<ModuleSeed> = serde_json::from_str(contents)
        .map_err(|e| ProgressError::InvalidCatalog(format!("malformed catalog JSON: {}", e)))?;
    ModuleCatalog::new(seeds.into_iter().map(ModuleDefinition::from).collect())
}

/// Load a catalog from a JSON seed file.
pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> Result<ModuleCatalog, ProgressError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        ProgressError::InvalidCatalog(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_catalog_json(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_minimal_and_full_entries() {
        let json = r#"[
            {"id": "basics", "order": 2},
            {"id": "intro", "order": 1, "title_key": "intro.title", "icon": "info"}
        ]"#;
        let catalog = parse_catalog_json(json).unwrap();
        assert_eq!(catalog.list()[0].id, "intro");
        assert_eq!(catalog.list()[0].title_key, "intro.title");
        assert_eq!(catalog.list()[0].description_key, "module1.description");
        assert_eq!(catalog.list()[1].title_key, "module2.title");
        assert_eq!(catalog.list()[1].icon, "");
    }

    #[test]
    fn rejects_malformed_and_invalid_catalogs() {
        assert!(matches!(
            parse_catalog_json("{not json"),
            Err(ProgressError::InvalidCatalog(_))
        ));
        assert!(matches!(
            parse_catalog_json(r#"[{"id": "a", "order": 2}]"#),
            Err(ProgressError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "only", "order": 1}}]"#).unwrap();
        let catalog = load_catalog_from_json(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        assert!(load_catalog_from_json("/nonexistent/catalog.json").is_err());
    }
}
