use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by mutating media cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Source file missing: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Item of {size} bytes exceeds cache capacity of {max_size} bytes")]
    CapacityExceeded { size: u64, max_size: u64 },

    #[error("Failed to delete {}: {source}", path.display())]
    DeletionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} file(s) could not be deleted: {}", failures.len(), DisplayFailures(failures))]
    BatchDeletion { failures: Vec<DeletionFailure> },

    #[error("Failed to create cache directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache is empty")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A single file the cache failed to delete during a batch operation
#[derive(Debug)]
pub struct DeletionFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

impl fmt::Display for DeletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

struct DisplayFailures<'a>(&'a [DeletionFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl CacheError {
    /// Turn collected batch failures into a result
    pub(crate) fn from_failures(failures: Vec<DeletionFailure>) -> Result<(), CacheError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CacheError::BatchDeletion { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_error_display() {
        let err = CacheError::CapacityExceeded {
            size: 2048,
            max_size: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Item of 2048 bytes exceeds cache capacity of 1024 bytes"
        );
    }

    #[test]
    fn test_batch_deletion_lists_every_failure() {
        let failures = vec![
            DeletionFailure {
                path: PathBuf::from("/cache/a.jpg"),
                error: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
            DeletionFailure {
                path: PathBuf::from("/cache/b.mp4"),
                error: io::Error::new(io::ErrorKind::Other, "busy"),
            },
        ];

        let err = CacheError::from_failures(failures).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("2 file(s) could not be deleted"));
        assert!(message.contains("/cache/a.jpg: denied"));
        assert!(message.contains("/cache/b.mp4: busy"));
    }

    #[test]
    fn test_no_failures_is_ok() {
        assert!(CacheError::from_failures(Vec::new()).is_ok());
    }
}
