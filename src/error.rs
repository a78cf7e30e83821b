// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for configuration, model construction, and result I/O.
//!
//! The recursion core itself is infallible: length mismatches between
//! vectors are programming errors and panic. Everything that depends on
//! user input (config files, lattice arrays, output directories) reports
//! through [`LsqtError`] so callers can pattern-match on the failure mode.

use std::path::PathBuf;

/// Errors arising from configuration, model construction, or file I/O.
#[derive(Debug, thiserror::Error)]
pub enum LsqtError {
    /// A configuration value violates a driver precondition.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Lattice arrays are inconsistent (lengths, neighbor indices, disorder).
    #[error("invalid model: {0}")]
    Model(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LsqtError {
    /// Attach a path to an `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LsqtError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = LsqtError::Config("number_of_moments must be even".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: number_of_moments must be even"
        );
    }

    #[test]
    fn display_model() {
        let err = LsqtError::Model("neighbor index 9 out of range".into());
        assert!(err.to_string().starts_with("invalid model"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = LsqtError::io(
            "/tmp/missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/missing.json"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: LsqtError = parse.unwrap_err().into();
        assert!(matches!(err, LsqtError::Json(_)));
    }

    #[test]
    fn error_trait_source() {
        use std::error::Error;
        let err = LsqtError::io("x", std::io::Error::new(std::io::ErrorKind::Other, "inner"));
        assert!(err.source().is_some());
    }
}
