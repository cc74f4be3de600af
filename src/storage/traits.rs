//! Learner storage traits for Abacus.
//!
//! This module defines the `LearnerStore` trait for learner document
//! persistence.

use std::sync::Arc;

use crate::core::LearnerRecord;
use crate::error::Result;

/// Guard held across one read-modify-write of a learner document.
///
/// Dropping the guard releases the lock.
pub struct LearnerLock {
    _guard: Option<Box<dyn Send>>,
}

impl LearnerLock {
    /// A guard that holds nothing, for stores with no cross-process writers.
    pub fn unlocked() -> Self {
        Self { _guard: None }
    }

    /// Wrap whatever keeps the lock alive.
    pub fn new(guard: impl Send + 'static) -> Self {
        Self {
            _guard: Some(Box::new(guard)),
        }
    }
}

impl std::fmt::Debug for LearnerLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearnerLock")
            .field("held", &self._guard.is_some())
            .finish()
    }
}

/// Trait for learner storage backends.
///
/// A `put` replaces the whole document in one step: readers see either the
/// previous document or the new one, never a mix.
pub trait LearnerStore: Send + Sync {
    /// Retrieve a learner document by id.
    ///
    /// Returns `Ok(None)` if the learner has never been recorded.
    fn get(&self, learner_id: &str) -> Result<Option<LearnerRecord>>;

    /// Save a learner document atomically.
    fn put(&self, record: &LearnerRecord) -> Result<()>;

    /// List stored learner ids, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Delete a learner document.
    ///
    /// Returns `Ok(())` even if the learner doesn't exist.
    fn delete(&self, learner_id: &str) -> Result<()>;

    /// Check if a learner document exists.
    fn exists(&self, learner_id: &str) -> Result<bool> {
        Ok(self.get(learner_id)?.is_some())
    }

    /// Take the exclusive lock on one learner's document.
    ///
    /// Blocks until every other holder, in this process or another, has
    /// released it. Stores only reachable from one process return an empty
    /// guard; the recorder's in-process mutex covers them.
    fn lock(&self, _learner_id: &str) -> Result<LearnerLock> {
        Ok(LearnerLock::unlocked())
    }
}

/// Blanket implementation of LearnerStore for Arc-wrapped stores.
///
/// Lets a test keep a handle on the store it hands to a `Recorder`.
impl<T: LearnerStore + ?Sized> LearnerStore for Arc<T> {
    fn get(&self, learner_id: &str) -> Result<Option<LearnerRecord>> {
        (**self).get(learner_id)
    }

    fn put(&self, record: &LearnerRecord) -> Result<()> {
        (**self).put(record)
    }

    fn list(&self) -> Result<Vec<String>> {
        (**self).list()
    }

    fn delete(&self, learner_id: &str) -> Result<()> {
        (**self).delete(learner_id)
    }

    fn lock(&self, learner_id: &str) -> Result<LearnerLock> {
        (**self).lock(learner_id)
    }
}

/// Test utilities for LearnerStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{Archetype, Progress};

    /// Test helper to verify LearnerStore implementations.
    pub fn test_learner_store_crud<S: LearnerStore>(store: &S) {
        let mut record = LearnerRecord::new("test-learner");

        // Initially should not exist
        assert!(!store.exists(&record.learner_id).unwrap());
        assert!(store.get(&record.learner_id).unwrap().is_none());

        store.put(&record).unwrap();
        assert!(store.exists(&record.learner_id).unwrap());

        // Overwrite with progress
        record.progress.insert(
            "column-addition".to_string(),
            Progress::default_for(Archetype::Modes),
        );
        store.put(&record).unwrap();
        let retrieved = store.get(&record.learner_id).unwrap().unwrap();
        assert_eq!(retrieved, record);

        assert_eq!(store.list().unwrap(), vec!["test-learner".to_string()]);

        store.delete(&record.learner_id).unwrap();
        assert!(!store.exists(&record.learner_id).unwrap());

        // Delete again should succeed
        store.delete(&record.learner_id).unwrap();
    }
}
