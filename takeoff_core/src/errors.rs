//! # Error Types
//!
//! Hard failures for takeoff_core. These are reserved for setup and I/O
//! problems: a missing package, an unreadable project file, a report that
//! could not be rendered. Data-quality problems (a conduit size missing from
//! the weight table, a malformed import row) are *not* errors; they travel in
//! the second channel of a result, see [`crate::diagnostics`].
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::errors::{TakeoffError, TakeoffResult};
//!
//! fn validate_factor(factor: f64) -> TakeoffResult<()> {
//!     if !(0.0..=1.0).contains(&factor) {
//!         return Err(TakeoffError::invalid_input(
//!             "pierced_hole_factor",
//!             factor.to_string(),
//!             "Factor must be between 0 and 1",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for takeoff_core operations
pub type TakeoffResult<T> = Result<T, TakeoffError>;

/// Structured error type for estimating operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum TakeoffError {
    /// An input value is invalid (out of range, unparseable, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The requested package index does not exist in the project
    #[error("Package {index} not found (project has {count} packages)")]
    PackageNotFound { index: usize, count: usize },

    /// Settings or context are inconsistent
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Report rendering failed
    #[error("Report failed: {reason}")]
    ReportFailed { reason: String },
}

impl TakeoffError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        TakeoffError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        TakeoffError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        TakeoffError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TakeoffError::FileLocked { .. })
    }

    /// Setup/programming errors, as opposed to I/O trouble
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TakeoffError::PackageNotFound { .. } | TakeoffError::Configuration { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            TakeoffError::InvalidInput { .. } => "INVALID_INPUT",
            TakeoffError::PackageNotFound { .. } => "PACKAGE_NOT_FOUND",
            TakeoffError::Configuration { .. } => "CONFIGURATION_ERROR",
            TakeoffError::FileError { .. } => "FILE_ERROR",
            TakeoffError::FileLocked { .. } => "FILE_LOCKED",
            TakeoffError::SerializationError { .. } => "SERIALIZATION_ERROR",
            TakeoffError::VersionMismatch { .. } => "VERSION_MISMATCH",
            TakeoffError::ReportFailed { .. } => "REPORT_FAILED",
        }
    }
}

impl From<serde_json::Error> for TakeoffError {
    fn from(e: serde_json::Error) -> Self {
        TakeoffError::SerializationError {
            reason: e.to_string(),
        }
    }
}
