//! Learner storage for Abacus.
//!
//! One document per learner, supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileLearnerStore;
pub use memory::MemoryLearnerStore;
pub use traits::{LearnerLock, LearnerStore};
