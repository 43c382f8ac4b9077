//! Progress persistence with versioned compare-and-swap writes
//!
//! Two members of a team can submit at the same moment. Every write names the
//! version it read; a stale write is rejected with `EscapeError::Conflict` so
//! the caller can re-read and re-apply instead of dropping an increment.

use escape_core::{EscapeError, ProgressKey, StoredProgress};
use std::collections::HashMap;
use std::sync::RwLock;

/// Storage seam for team progress rows
pub trait ProgressStore: Send + Sync {
    /// Current row for a key, if any
    fn load(&self, key: &ProgressKey) -> Result<Option<StoredProgress>, EscapeError>;

    /// Write `row` if the stored version is still `expected_version` (0 = absent).
    ///
    /// Returns the new version. It is greater than every version the store has
    /// handed out before, including those of removed rows, so a writer holding
    /// a version from before a reset can never match the row written after it.
    fn compare_and_swap(
        &self,
        key: &ProgressKey,
        expected_version: u64,
        row: StoredProgress,
    ) -> Result<u64, EscapeError>;

    /// Delete a row; `true` if one existed
    fn remove(&self, key: &ProgressKey) -> Result<bool, EscapeError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    inner: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    rows: HashMap<ProgressKey, StoredProgress>,
    /// Highest version issued so far; survives removals
    last_version: u64,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> EscapeError {
    EscapeError::Store("progress store lock poisoned".to_string())
}

impl ProgressStore for InMemoryProgressStore {
    fn load(&self, key: &ProgressKey) -> Result<Option<StoredProgress>, EscapeError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.rows.get(key).cloned())
    }

    fn compare_and_swap(
        &self,
        key: &ProgressKey,
        expected_version: u64,
        mut row: StoredProgress,
    ) -> Result<u64, EscapeError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let found = inner.rows.get(key).map(|r| r.version).unwrap_or(0);
        if found != expected_version {
            return Err(EscapeError::Conflict {
                expected: expected_version,
                found,
            });
        }

        inner.last_version += 1;
        let version = inner.last_version;
        row.version = version;
        inner.rows.insert(key.clone(), row);
        Ok(version)
    }

    fn remove(&self, key: &ProgressKey) -> Result<bool, EscapeError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        Ok(inner.rows.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row() -> StoredProgress {
        StoredProgress {
            current_stage_index: 1,
            solved_stages: "[]".to_string(),
            scene_state: "{}".to_string(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_then_update() {
        let store = InMemoryProgressStore::new();
        let key = ProgressKey::new("red", "vault");
        assert!(store.load(&key).unwrap().is_none());

        assert_eq!(store.compare_and_swap(&key, 0, row()).unwrap(), 1);
        assert_eq!(store.compare_and_swap(&key, 1, row()).unwrap(), 2);
        assert_eq!(store.load(&key).unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_stale_write_conflicts() {
        let store = InMemoryProgressStore::new();
        let key = ProgressKey::new("red", "vault");
        store.compare_and_swap(&key, 0, row()).unwrap();

        let err = store.compare_and_swap(&key, 0, row()).unwrap_err();
        assert_eq!(err, EscapeError::Conflict { expected: 0, found: 1 });
    }

    #[test]
    fn test_remove() {
        let store = InMemoryProgressStore::new();
        let key = ProgressKey::new("red", "vault");
        store.compare_and_swap(&key, 0, row()).unwrap();
        assert!(store.remove(&key).unwrap());
        assert!(!store.remove(&key).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_write_after_reset_conflicts() {
        let store = InMemoryProgressStore::new();
        let key = ProgressKey::new("red", "vault");
        let held = store.compare_and_swap(&key, 0, row()).unwrap();
        assert_eq!(held, 1);

        // Reset, then the team starts over before the old writer comes back.
        assert!(store.remove(&key).unwrap());
        let mut restarted = row();
        restarted.current_stage_index = 2;
        assert_eq!(store.compare_and_swap(&key, 0, restarted).unwrap(), 2);

        let err = store.compare_and_swap(&key, held, row()).unwrap_err();
        assert_eq!(err, EscapeError::Conflict { expected: 1, found: 2 });
        assert_eq!(store.load(&key).unwrap().unwrap().current_stage_index, 2);
    }

    #[test]
    fn test_versions_are_store_wide() {
        let store = InMemoryProgressStore::new();
        let red = ProgressKey::new("red", "vault");
        let blue = ProgressKey::new("blue", "vault");
        assert_eq!(store.compare_and_swap(&red, 0, row()).unwrap(), 1);
        assert_eq!(store.compare_and_swap(&blue, 0, row()).unwrap(), 2);
        assert_eq!(store.compare_and_swap(&red, 1, row()).unwrap(), 3);
    }
}
