use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid menu item at {path}: {source}")]
    Item {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a row move was refused. None of these change the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("source and target are the same row")]
    SameIndex,

    #[error("row index {index} is out of range ({len} rows)")]
    OutOfRange { index: usize, len: usize },

    #[error("cannot drop a row inside its own subtree")]
    IntoOwnSubtree,

    #[error("the dragged row changed since the drag started")]
    StaleDrag,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("no menu at index {index} ({len} menus)")]
    NoSuchMenu { index: usize, len: usize },
}
