//! High-level API for sprig repositories.
//!
//! [`Repository`] wires the staging area to an on-disk object store, the
//! HEAD commit, and the working tree. It is the collaborator that stages
//! removals and turns the staged state into commits.

pub mod commit;
pub mod config;
pub mod error;
pub mod head;
pub mod repository;
pub mod status;

pub use commit::{Commit, CommitSummary};
pub use config::RepoConfig;
pub use error::{SdkError, SdkResult};
pub use head::HeadSnapshot;
pub use repository::{RemoveOutcome, Repository};
pub use status::Status;

pub use sprig_index::{AddOutcome, RemovalUndo, RepoLayout, StageError};
pub use sprig_types::{Content, ObjectId, RepoPath, Snapshot};
