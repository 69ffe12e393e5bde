//! Structured result channel between a spawned call and its parent.
//!
//! A child process measures its call, writes a [`CallReport`] to a path its
//! parent chose, and exits. The parent reads the report back after the
//! OS-level wait. The exit status only classifies the run (success, runtime
//! failure, usage error); the measured duration always travels through the
//! report, so it is never squeezed into the exit-code range.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What one spawned call measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReport {
    /// Wall-clock duration of the invocation, in milliseconds.
    pub elapsed_ms: u64,
}

impl CallReport {
    /// Encode and write the report to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| Error::Protocol(format!("failed to encode call report: {}", e)))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Read and decode the report at `path`.
    ///
    /// A missing file means the child never got as far as recording a
    /// result; callers must treat that as a failed retrieval, not a zero.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| {
            Error::Invocation(format!(
                "no call report at {}: {}",
                path.display(),
                e
            ))
        })?;
        bincode::deserialize(&bytes)
            .map_err(|e| Error::Protocol(format!("failed to decode call report: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("call.report");

        let report = CallReport { elapsed_ms: 1234 };
        report.write(&path).unwrap();

        assert_eq!(CallReport::read(&path).unwrap(), report);
    }

    #[test]
    fn test_missing_report_is_invocation_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.report");

        let err = CallReport::read(&path).unwrap_err();
        assert!(matches!(err, Error::Invocation(_)));
    }

    #[test]
    fn test_corrupt_report_is_protocol_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corrupt.report");
        fs::write(&path, b"x").unwrap();

        let err = CallReport::read(&path).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
