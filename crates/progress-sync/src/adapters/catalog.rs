//! Static Module Catalog
//!
//! Implements the `Catalog` port from a fixed table, optionally loaded from
//! a JSON file of `[{ "id", "xpReward", "title" }]` entries.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{ModuleCatalogEntry, ProgressError};
use crate::ports::outbound::Catalog;

/// Fixed in-memory module catalog.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entries: HashMap<String, ModuleCatalogEntry>,
}

impl StaticCatalog {
    /// Build a catalog from entries. A later entry with the same id wins.
    pub fn from_entries(entries: Vec<ModuleCatalogEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.module_id.clone(), e))
                .collect(),
        }
    }

    /// Load a catalog from a JSON array file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProgressError::StorageRead(format!("{}: {e}", path.display())))?;
        let entries: Vec<ModuleCatalogEntry> = serde_json::from_str(&contents)?;
        tracing::debug!(
            "[progress] Loaded {} catalog entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self::from_entries(entries))
    }

    /// Number of modules in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn lookup(&self, module_id: &str) -> Option<ModuleCatalogEntry> {
        self.entries.get(module_id).cloned()
    }
}
