use std::path::PathBuf;
use thiserror::Error;

use crate::error::DocumentError;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("{0} is required to build a document watcher")]
    MissingPart(&'static str),

    #[error("File watch backend unavailable: {0}")]
    Backend(#[from] notify::Error),

    #[error("Cannot subscribe to changes under {root}: {source}")]
    Subscribe {
        root: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Initial scan failed: {0}")]
    InitialScan(#[source] DocumentError),

    #[error("Directory scan task failed: {0}")]
    ScanTask(#[from] tokio::task::JoinError),

    #[error("Change event receiver dropped")]
    Closed,
}
