use std::path::PathBuf;

use sprig_types::{ObjectId, TypeError};

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// The stored object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A file inside a store directory could not be interpreted.
    #[error("corrupt store entry {path}: {reason}")]
    CorruptEntry { path: PathBuf, reason: String },

    /// A stored path name failed validation.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] TypeError),

    /// Attempted to write an object that hashes to the null ID.
    #[error("cannot store object with null ID")]
    NullObjectId,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
