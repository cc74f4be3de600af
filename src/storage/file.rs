//! File-based learner storage for Abacus.
//!
//! Learners are stored as JSON documents in `~/.abacus/learners/`.
//! Each write goes to a uniquely named temp file that is fsynced and renamed
//! over the document, so a recording either lands completely or not at all.
//! Read-modify-write cycles from separate processes are serialized by an
//! advisory lock on `.<learner>.lock` next to the document.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;

use crate::config::learners_dir;
use crate::core::{validate_learner_id, LearnerRecord};
use crate::error::{AbacusError, Result};
use crate::storage::{LearnerLock, LearnerStore};
use crate::util::{read_optional_with_limit, MAX_DOCUMENT_SIZE};

/// File-based learner storage.
#[derive(Debug, Clone)]
pub struct FileLearnerStore {
    /// Directory where learner documents are stored.
    dir: PathBuf,
}

impl FileLearnerStore {
    /// Create a store in the default directory.
    ///
    /// Uses `~/.abacus/learners/` or `$ABACUS_HOME/learners/`.
    pub fn new() -> Result<Self> {
        let dir = learners_dir().ok_or_else(|| {
            AbacusError::config("Could not determine learners directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store in a custom directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| AbacusError::storage(&dir, e))?;
        }
        Ok(Self { dir })
    }

    /// Directory holding the documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, learner_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", learner_id))
    }

    fn lock_path(&self, learner_id: &str) -> PathBuf {
        self.dir.join(format!(".{}.lock", learner_id))
    }

    fn atomic_write(&self, record: &LearnerRecord) -> Result<()> {
        let final_path = self.document_path(&record.learner_id);
        let json = serde_json::to_string_pretty(record)?;

        // Dropped (and removed) on any error before persist
        let mut temp = Builder::new()
            .prefix(&format!(".{}.", record.learner_id))
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| AbacusError::storage(&self.dir, e))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| AbacusError::storage(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| AbacusError::storage(temp.path(), e))?;

        // Rename is atomic on POSIX
        temp.persist(&final_path)
            .map_err(|e| AbacusError::storage(&final_path, e.error))?;

        tracing::trace!(learner = %record.learner_id, path = %final_path.display(), "wrote learner document");
        Ok(())
    }
}

impl LearnerStore for FileLearnerStore {
    fn get(&self, learner_id: &str) -> Result<Option<LearnerRecord>> {
        validate_learner_id(learner_id)?;
        let path = self.document_path(learner_id);

        let Some(content) = read_optional_with_limit(&path, MAX_DOCUMENT_SIZE)? else {
            return Ok(None);
        };
        let record: LearnerRecord = serde_json::from_str(&content)
            .map_err(|e| AbacusError::serde(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record))
    }

    fn put(&self, record: &LearnerRecord) -> Result<()> {
        validate_learner_id(&record.learner_id)?;
        self.atomic_write(record)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| AbacusError::storage(&self.dir, e))?;
        let mut ids = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| AbacusError::storage(&self.dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if stem.starts_with('.') || validate_learner_id(&stem).is_err() {
                continue;
            }
            ids.push(stem);
        }

        ids.sort();
        Ok(ids)
    }

    fn delete(&self, learner_id: &str) -> Result<()> {
        validate_learner_id(learner_id)?;
        let path = self.document_path(learner_id);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| AbacusError::storage(&path, e))?;
        }

        Ok(())
    }

    /// The lock file is never removed: another process may be blocked on it.
    fn lock(&self, learner_id: &str) -> Result<LearnerLock> {
        validate_learner_id(learner_id)?;
        let path = self.lock_path(learner_id);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| AbacusError::storage(&path, e))?;
        file.lock().map_err(|e| AbacusError::storage(&path, e))?;

        tracing::trace!(learner = %learner_id, path = %path.display(), "acquired learner lock");
        Ok(LearnerLock::new(file))
    }
}
