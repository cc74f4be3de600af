//! Small file helpers shared by the storage layer.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{AbacusError, Result};

/// Largest learner document read into memory (64 MB).
pub const MAX_DOCUMENT_SIZE: u64 = 64 * 1024 * 1024;

/// Read a file into a string, refusing files larger than `max_size`.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_optional_with_limit(path: &Path, max_size: u64) -> Result<Option<String>> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AbacusError::storage(path, e)),
    };

    if metadata.len() > max_size {
        return Err(AbacusError::storage(
            path,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "document too large ({} bytes, max {} bytes)",
                    metadata.len(),
                    max_size
                ),
            ),
        ));
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| AbacusError::storage(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let result = read_optional_with_limit(&temp.path().join("nope.json"), 100).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_within_limit() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("small.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(
            read_optional_with_limit(&path, 100).unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_limit_boundary() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("boundary.json");
        fs::write(&path, "x".repeat(100)).unwrap();

        assert!(read_optional_with_limit(&path, 100).is_ok());
        let err = read_optional_with_limit(&path, 99).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(err.is_recoverable());
    }
}
