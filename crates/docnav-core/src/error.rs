//! Error types for docnav operations
//!
//! Every failure a caller can act on has its own variant and a stable
//! machine-readable code (`PATH_NOT_FOUND`, `CONFLICT`, ...). Nothing here
//! is fatal to the process: the index stays usable after any error.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Result type for docnav operations
pub type Result<T> = std::result::Result<T, NavError>;

/// Errors returned by index, search and edit operations
#[derive(Debug, Error)]
pub enum NavError {
    /// A parameter was out of range or malformed
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// No section has the requested path
    #[error("Section not found: {path}")]
    PathNotFound {
        path: String,
        suggestions: Vec<String>,
    },

    /// The section content changed since the caller read it
    #[error("Section '{path}' was modified (expected hash {expected}, found {actual})")]
    Conflict {
        path: String,
        expected: String,
        actual: String,
    },

    /// The indexed location no longer holds the section's heading
    #[error("Section '{path}' is no longer at {file}:{line}; the index is out of date")]
    StaleSection {
        path: String,
        file: String,
        line: usize,
    },

    /// Unknown insert position
    #[error("Invalid position '{value}': must be one of before, after, append")]
    InvalidPosition { value: String },

    /// A source file could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NavError {
    /// Create an invalid parameter error
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        NavError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error for a path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        NavError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            NavError::InvalidParameter { .. } => "INVALID_PARAMETER",
            NavError::PathNotFound { .. } => "PATH_NOT_FOUND",
            NavError::Conflict { .. } | NavError::StaleSection { .. } => "CONFLICT",
            NavError::InvalidPosition { .. } => "INVALID_POSITION",
            NavError::Io { .. } => "IO_ERROR",
        }
    }

    /// Whether the caller sent something malformed (as opposed to asking
    /// for something that does not exist or has changed)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            NavError::InvalidParameter { .. } | NavError::InvalidPosition { .. }
        )
    }

    /// Structured form for responses
    pub fn to_detail(&self) -> ErrorDetail {
        let details = match self {
            NavError::InvalidParameter { name, .. } => Some(json!({ "parameter": name })),
            NavError::PathNotFound { path, suggestions } => Some(json!({
                "path": path,
                "suggestions": suggestions,
            })),
            NavError::Conflict {
                path,
                expected,
                actual,
            } => Some(json!({
                "path": path,
                "expected_hash": expected,
                "current_hash": actual,
            })),
            NavError::StaleSection { path, file, line } => Some(json!({
                "path": path,
                "file": file,
                "line": line,
            })),
            NavError::InvalidPosition { value } => Some(json!({
                "position": value,
                "valid": ["before", "after", "append"],
            })),
            NavError::Io { path, .. } => Some(json!({ "file": path.display().to_string() })),
        };

        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// Serializable error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code, e.g. `PATH_NOT_FOUND`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Variant-specific fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
