//! Change notifications pushed to connected clients.

use serde::{Deserialize, Serialize};

/// A normalized file change, carrying the root-relative path.
///
/// Serialized as `{"type": "file-added" | "file-changed" | "file-removed", "path": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    #[serde(rename = "file-added")]
    Added { path: String },
    #[serde(rename = "file-changed")]
    Changed { path: String },
    #[serde(rename = "file-removed")]
    Removed { path: String },
}

impl ChangeEvent {
    pub fn added(path: impl Into<String>) -> Self {
        Self::Added { path: path.into() }
    }

    pub fn changed(path: impl Into<String>) -> Self {
        Self::Changed { path: path.into() }
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self::Removed { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Added { path } | Self::Changed { path } | Self::Removed { path } => path,
        }
    }

    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "file-added",
            Self::Changed { .. } => "file-changed",
            Self::Removed { .. } => "file-removed",
        }
    }
}
