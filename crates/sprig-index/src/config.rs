//! Repository layout and staging configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Name of the metadata directory under the working root.
pub const META_DIR: &str = ".sprig";

/// Fixed locations of every durable artifact, derived from the working root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(META_DIR)
    }

    /// Content staged for addition.
    pub fn stage_dir(&self) -> PathBuf {
        self.meta_dir().join("stage")
    }

    /// Content staged for removal.
    pub fn removal_dir(&self) -> PathBuf {
        self.meta_dir().join("stage_rm")
    }

    /// The serialized addition index.
    pub fn index_file(&self) -> PathBuf {
        self.meta_dir().join("staged_save")
    }

    /// Content-addressed blobs and commit records.
    pub fn objects_dir(&self) -> PathBuf {
        self.meta_dir().join("objects")
    }

    pub fn head_file(&self) -> PathBuf {
        self.meta_dir().join("HEAD")
    }

    pub fn config_file(&self) -> PathBuf {
        self.meta_dir().join("config.toml")
    }

    /// Returns `true` if a repository has been initialized at this root.
    pub fn is_initialized(&self) -> bool {
        self.index_file().is_file()
    }
}

/// What a restoring `add` cancels when the re-added content matches the
/// content staged for removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalUndo {
    /// Clear every pending removal.
    #[default]
    Batch,
    /// Clear only the re-added path's removal.
    Path,
}

/// Configuration for opening a staging area.
#[derive(Clone, Debug)]
pub struct StagingConfig {
    pub layout: RepoLayout,
    pub removal_undo: RemovalUndo,
}

impl StagingConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: RepoLayout::new(root),
            removal_undo: RemovalUndo::default(),
        }
    }

    pub fn with_removal_undo(mut self, removal_undo: RemovalUndo) -> Self {
        self.removal_undo = removal_undo;
        self
    }
}
