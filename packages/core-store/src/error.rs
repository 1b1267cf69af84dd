//! Error types shared by every dotstore layer.

use crate::path::PathError;

/// Errors raised by store and collection operations.
///
/// `Path` and `InvalidCollectionName` are caller mistakes. `ShapeConflict`,
/// `IndexOutOfBounds` and `InteriorIndex` mean the operation was rejected
/// and nothing changed. `Persist` and `Json` mean the in-memory state changed but the
/// snapshot could not be written.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path error: {0}")]
    Path(#[from] PathError),

    #[error("cannot traverse into {found} at '{path}'")]
    ShapeConflict { path: String, found: &'static str },

    #[error("index {index} out of bounds at '{path}' (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("cannot delete index {index} at '{path}' (length {len}); only the last element can be removed")]
    InteriorIndex {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("invalid collection name: {name:?}")]
    InvalidCollectionName { name: String },

    #[error("snapshot I/O error at {location}: {source}")]
    Persist {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors raised after the in-memory state was already changed.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persist { .. } | Error::Json(_))
    }
}
