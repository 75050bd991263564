//! Error types for the staging area.

use sprig_store::StoreError;
use sprig_types::RepoPath;

/// Durable state could not be read, written, or decoded.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Underlying store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The index record does not start with the expected magic bytes.
    #[error("invalid index record magic: {found:?}")]
    InvalidMagic { found: [u8; 4] },

    /// The index record was written by an unknown format version.
    #[error("unsupported index record version: {0}")]
    UnsupportedVersion(u32),

    /// The index record is shorter than its header claims.
    #[error("truncated index record: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The index record payload fails its checksum.
    #[error("index record checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// The index record payload could not be encoded or decoded.
    #[error("index record serialization error: {0}")]
    Serialization(String),

    /// The index lists a path whose staged content is gone.
    #[error("staged content missing for {0}")]
    MissingContent(RepoPath),
}

/// Errors that can occur during staging operations.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The file to add does not exist in the working tree.
    #[error("file does not exist: {0}")]
    NotFound(RepoPath),

    /// No staging area has been initialized at the given location.
    #[error("staging area not initialized at {0}")]
    NotInitialized(String),

    /// Durable state is unreadable, unwritable, or corrupt.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl From<StoreError> for StageError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(PersistenceError::Store(e))
    }
}

/// Convenience alias for staging results.
pub type StageResult<T> = Result<T, StageError>;
