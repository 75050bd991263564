//! Working directory status.
//!
//! Compares HEAD, the staged state, and the working tree.

use serde::Serialize;

use sprig_types::RepoPath;

/// Complete status of the working directory relative to HEAD and the
/// staging area.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Paths staged for addition.
    pub staged: Vec<RepoPath>,
    /// Paths staged for removal.
    pub removed: Vec<RepoPath>,
    /// Tracked or staged files whose working bytes differ from what the
    /// next commit would record.
    pub modified: Vec<RepoPath>,
    /// Tracked files missing from the working tree but not staged for removal.
    pub deleted: Vec<RepoPath>,
    /// Files neither committed nor staged.
    pub untracked: Vec<RepoPath>,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }

    /// Returns `true` if a commit would record anything.
    pub fn has_staged_changes(&self) -> bool {
        !self.staged.is_empty() || !self.removed.is_empty()
    }
}
