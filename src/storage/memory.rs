//! In-memory learner storage.
//!
//! Thread-safe implementation of the `LearnerStore` trait, used by tests and
//! by the CLI `play` simulation when run with `--ephemeral`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::LearnerRecord;
use crate::error::{AbacusError, Result};
use crate::storage::LearnerStore;

/// In-memory learner store.
///
/// Documents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryLearnerStore {
    learners: RwLock<HashMap<String, LearnerRecord>>,
}

impl MemoryLearnerStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, LearnerRecord>>> {
        self.learners
            .read()
            .map_err(|_| AbacusError::transient("learner store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, LearnerRecord>>> {
        self.learners
            .write()
            .map_err(|_| AbacusError::transient("learner store lock poisoned"))
    }

    /// Number of stored learners.
    pub fn len(&self) -> usize {
        self.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LearnerStore for MemoryLearnerStore {
    fn get(&self, learner_id: &str) -> Result<Option<LearnerRecord>> {
        Ok(self.read()?.get(learner_id).cloned())
    }

    fn put(&self, record: &LearnerRecord) -> Result<()> {
        self.write()?
            .insert(record.learner_id.clone(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, learner_id: &str) -> Result<()> {
        self.write()?.remove(learner_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_learner_store_crud;

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryLearnerStore::new();
        test_learner_store_crud(&store);
    }

    #[test]
    fn test_len_and_is_empty() {
        let store = MemoryLearnerStore::new();
        assert!(store.is_empty());

        store.put(&LearnerRecord::new("ada")).unwrap();
        store.put(&LearnerRecord::new("bob")).unwrap();
        store.put(&LearnerRecord::new("ada")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.list().unwrap(), vec!["ada", "bob"]);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryLearnerStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let id = format!("learner-{}", i);
                    store.put(&LearnerRecord::new(&id)).unwrap();
                    assert!(store.exists(&id).unwrap());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
    }
}
