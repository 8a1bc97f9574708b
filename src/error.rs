//! Error taxonomy for document requests.
//!
//! Every request-path failure collapses into one of three kinds. Each kind
//! has a stable wire code that the HTTP layer puts in the `error` field.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by path resolution, discovery and content access.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The requested path resolves outside the served root.
    #[error("Access to '{path}' is not allowed")]
    Forbidden { path: String },

    /// The path is inside the root but missing, or is not a regular file.
    #[error("File not found: {path}")]
    NotFound { path: String },

    /// The root itself could not be enumerated.
    #[error("Failed to discover documents under {root}: {reason}")]
    Discovery { root: PathBuf, reason: String },
}

impl DocumentError {
    pub fn forbidden(path: impl Into<String>) -> Self {
        Self::Forbidden { path: path.into() }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Discovery { .. } => "FILE_DISCOVERY_ERROR",
        }
    }

    /// HTTP status code for this error kind.
    pub fn status(&self) -> u16 {
        match self {
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Discovery { .. } => 500,
        }
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
