//! Local persistent store for anonymous cart entries.
//!
//! A single namespaced JSON document holding the ordered list of pending
//! entries. The contract is deliberately blunt:
//!
//! - Read: parse-or-empty-on-any-error. A corrupt file is an empty cart, not
//!   an error the user ever sees.
//! - Write: serialize the whole list on every mutation, no partial updates.
//! - Clear: delete the file.
//!
//! There is no cross-process lock; concurrent writers can race. That is
//! acceptable for a best-effort anonymous cart.

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use mercato_core::{local_total_items, AttributeMap, LocalCartEntry, ProductRef};

/// File name of the pending-cart document inside the data directory.
const CART_FILE: &str = "pending_cart.json";

/// Errors from the local cart store.
///
/// Only writes surface errors; reads recover silently.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON-file-backed store of pending anonymous cart entries.
#[derive(Debug, Clone)]
pub struct LocalCartStore {
    path: PathBuf,
}

impl LocalCartStore {
    /// Create a store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(CART_FILE),
        }
    }

    /// Read all pending entries.
    ///
    /// Any failure (missing file, unreadable file, malformed JSON) is
    /// recovered silently as an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<LocalCartEntry> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt local cart");
                Vec::new()
            }
        }
    }

    /// Persist the whole entry list, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, entries: &[LocalCartEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Add an entry, merging with an existing one when the identity pair
    /// `(product_ref, selected_attributes)` matches by deep equality.
    ///
    /// Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be persisted.
    pub fn upsert(
        &self,
        product_ref: ProductRef,
        quantity: u32,
        selected_attributes: AttributeMap,
        note: Option<String>,
    ) -> Result<Vec<LocalCartEntry>, StoreError> {
        let mut entries = self.load();

        if let Some(existing) = entries
            .iter_mut()
            .find(|entry| entry.matches(&product_ref, &selected_attributes))
        {
            existing.quantity += quantity;
        } else {
            entries.push(LocalCartEntry::new(
                product_ref,
                quantity,
                selected_attributes,
                note,
            ));
        }

        self.save(&entries)?;
        Ok(entries)
    }

    /// Delete the pending-cart document. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for real I/O failures.
    pub fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Sum of quantities across all pending entries.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        local_total_items(&self.load())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn store() -> (TempDir, LocalCartStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalCartStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.load().is_empty());
        assert_eq!(store.total_items(), 0);
    }

    #[test]
    fn test_upsert_merges_matching_identity() {
        let (_dir, store) = store();

        store
            .upsert(ProductRef::new("P1"), 2, attrs(&[("size", "M")]), None)
            .unwrap();
        let entries = store
            .upsert(ProductRef::new("P1"), 3, attrs(&[("size", "M")]), None)
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().unwrap().quantity, 5);
        assert_eq!(store.total_items(), 5);
    }

    #[test]
    fn test_upsert_differing_attributes_appends() {
        let (_dir, store) = store();

        store
            .upsert(ProductRef::new("P1"), 1, attrs(&[("size", "M")]), None)
            .unwrap();
        let entries = store
            .upsert(ProductRef::new("P1"), 1, attrs(&[("size", "L")]), None)
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(store.total_items(), 2);
    }

    #[test]
    fn test_upsert_preserves_insertion_order() {
        let (_dir, store) = store();

        store
            .upsert(ProductRef::new("P1"), 1, AttributeMap::new(), None)
            .unwrap();
        store
            .upsert(ProductRef::new("P2"), 1, AttributeMap::new(), None)
            .unwrap();
        let entries = store
            .upsert(ProductRef::new("P1"), 1, AttributeMap::new(), None)
            .unwrap();

        let refs: Vec<&str> = entries
            .iter()
            .map(|entry| entry.product_ref.as_str())
            .collect();
        assert_eq!(refs, vec!["P1", "P2"]);
    }

    #[test]
    fn test_corrupt_file_recovers_as_empty() {
        let (dir, store) = store();
        std::fs::write(dir.path().join(CART_FILE), "{not json").unwrap();

        assert!(store.load().is_empty());

        // And the store remains writable afterwards
        let entries = store
            .upsert(ProductRef::new("P1"), 1, AttributeMap::new(), None)
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_clear_removes_file_and_is_idempotent() {
        let (_dir, store) = store();
        store
            .upsert(ProductRef::new("P1"), 1, AttributeMap::new(), None)
            .unwrap();

        store.clear().unwrap();
        assert!(store.load().is_empty());

        // Clearing again is a no-op
        store.clear().unwrap();
    }
}
