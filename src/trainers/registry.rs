//! Registry of available trainers.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::Trainer;
use crate::error::{AbacusError, Result};
use crate::trainers::{ColumnTrainer, DrillTrainer, TrainerAdapter};

/// Trainers addressable by id.
#[derive(Clone, Default)]
pub struct TrainerRegistry {
    adapters: BTreeMap<String, Arc<dyn TrainerAdapter>>,
}

impl TrainerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in trainers.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ColumnTrainer::addition()));
        registry.register(Arc::new(ColumnTrainer::subtraction()));
        registry.register(Arc::new(DrillTrainer::times_tables()));
        registry
    }

    /// Add or replace a trainer.
    pub fn register(&mut self, adapter: Arc<dyn TrainerAdapter>) {
        let id = adapter.id().to_string();
        if self.adapters.insert(id.clone(), adapter).is_some() {
            tracing::debug!(trainer = %id, "replaced registered trainer");
        }
    }

    /// Look up a trainer adapter.
    pub fn get(&self, trainer_id: &str) -> Result<Arc<dyn TrainerAdapter>> {
        self.adapters
            .get(trainer_id)
            .cloned()
            .ok_or_else(|| AbacusError::unknown_trainer(trainer_id))
    }

    /// Trainer descriptions, ordered by id.
    pub fn trainers(&self) -> Vec<&Trainer> {
        self.adapters.values().map(|a| a.trainer()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for TrainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainerRegistry")
            .field("trainers", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}
