//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors describe content that cannot be compiled into a pack.
/// They carry the offending file so callers can report precisely.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("syntax error in {path}: {message}")]
    Syntax { path: PathBuf, message: String },

    #[error("expected a map at the top level of {path}, found {found}")]
    Shape { path: PathBuf, found: String },

    #[error("could not open include {path}: {reason}")]
    Include { path: PathBuf, reason: IncludeFailure },
}

/// Why an include directive could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFailure {
    OutsidePackRoot,
    NotFound,
    CycleDetected,
}

impl std::fmt::Display for IncludeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncludeFailure::OutsidePackRoot => f.write_str("outside pack root"),
            IncludeFailure::NotFound => f.write_str("not found"),
            IncludeFailure::CycleDetected => f.write_str("cycle detected"),
        }
    }
}

impl DomainError {
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DomainError::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn include(path: impl Into<PathBuf>, reason: IncludeFailure) -> Self {
        DomainError::Include {
            path: path.into(),
            reason,
        }
    }

    /// The file the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            DomainError::Syntax { path, .. }
            | DomainError::Shape { path, .. }
            | DomainError::Include { path, .. } => path,
        }
    }
}
