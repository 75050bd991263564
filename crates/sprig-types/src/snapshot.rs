//! The path → content mapping of one commit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::path::RepoPath;

/// Files recorded by a commit, keyed by path.
///
/// A `Snapshot` handed to the staging area is read-only for the duration of
/// the call that received it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    files: BTreeMap<RepoPath, Content>,
}

impl Snapshot {
    /// An empty snapshot (no files committed yet).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &RepoPath) -> Option<&Content> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &RepoPath) -> bool {
        self.files.contains_key(path)
    }

    pub fn insert(&mut self, path: RepoPath, content: Content) -> Option<Content> {
        self.files.insert(path, content)
    }

    pub fn remove(&mut self, path: &RepoPath) -> Option<Content> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &RepoPath> {
        self.files.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RepoPath, &Content)> {
        self.files.iter()
    }
}

impl FromIterator<(RepoPath, Content)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (RepoPath, Content)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Snapshot {
    type Item = (RepoPath, Content);
    type IntoIter = std::collections::btree_map::IntoIter<RepoPath, Content>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}
