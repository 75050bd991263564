use std::path::PathBuf;

use sprig_types::RepoPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("a repository already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("no changes added to the commit")]
    NothingToCommit,

    #[error("please enter a commit message")]
    EmptyMessage,

    #[error("no reason to remove {0}: not staged and not tracked")]
    NothingToRemove(RepoPath),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("staging error: {0}")]
    Stage(#[from] sprig_index::StageError),

    #[error("store error: {0}")]
    Store(#[from] sprig_store::StoreError),
}

pub type SdkResult<T> = Result<T, SdkError>;
