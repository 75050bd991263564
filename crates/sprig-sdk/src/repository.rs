use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use sprig_index::{
    AddOutcome, PersistenceError, RepoLayout, StageError, StagingArea, StagingConfig,
};
use sprig_store::{FsObjectStore, FsWorkingTree, ObjectStore, SnapshotProvider, StoredObject, WorkingTree};
use sprig_types::{Content, ObjectId, RepoPath, Snapshot};

use crate::commit::{Commit, CommitSummary};
use crate::config::RepoConfig;
use crate::error::{SdkError, SdkResult};
use crate::head::HeadSnapshot;
use crate::status::Status;

/// What `remove` did to a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The path was only staged for addition; it is no longer staged.
    Unstaged,
    /// The path is tracked; it is staged for removal and gone from the
    /// working tree.
    StagedForRemoval,
}

/// A sprig repository rooted at a working directory.
pub struct Repository {
    layout: RepoLayout,
    config: RepoConfig,
    objects: Arc<FsObjectStore>,
    head: Arc<HeadSnapshot>,
    worktree: FsWorkingTree,
    stage: StagingArea,
}

impl Repository {
    /// Create a repository at `root` with an empty initial commit.
    pub fn init(root: impl Into<PathBuf>) -> SdkResult<Self> {
        let layout = RepoLayout::new(root);
        if layout.is_initialized() {
            return Err(SdkError::AlreadyInitialized(layout.root().to_path_buf()));
        }
        fs::create_dir_all(layout.meta_dir()).map_err(sprig_store::StoreError::from)?;

        let config = RepoConfig::load(&layout.config_file())?;
        config.save(&layout.config_file())?;

        let objects = Arc::new(FsObjectStore::open(layout.objects_dir())?);
        let initial = objects.write(&Commit::initial().to_stored_object()?)?;
        sprig_store::fs::write_atomic(&layout.head_file(), initial.to_hex().as_bytes())?;

        let head = Arc::new(HeadSnapshot::new(layout.head_file(), objects.clone()));
        let staging = Self::staging_config(&layout, &config);
        let stage = StagingArea::init_at(&staging, head.clone())?;

        info!(root = ?layout.root(), commit = %initial.short_hex(), "repository initialized");
        Ok(Self::assemble(layout, config, objects, head, stage))
    }

    /// Open the repository at `root`.
    pub fn open(root: impl Into<PathBuf>) -> SdkResult<Self> {
        let layout = RepoLayout::new(root);
        if !layout.is_initialized() {
            return Err(SdkError::NotInitialized(layout.root().to_path_buf()));
        }

        let config = RepoConfig::load(&layout.config_file())?;
        let objects = Arc::new(FsObjectStore::open(layout.objects_dir())?);
        let head = Arc::new(HeadSnapshot::new(layout.head_file(), objects.clone()));
        let staging = Self::staging_config(&layout, &config);
        let stage = StagingArea::open_at(&staging, head.clone())?;

        debug!(root = ?layout.root(), "repository opened");
        Ok(Self::assemble(layout, config, objects, head, stage))
    }

    fn staging_config(layout: &RepoLayout, config: &RepoConfig) -> StagingConfig {
        StagingConfig::new(layout.root()).with_removal_undo(config.staging.removal_undo)
    }

    fn assemble(
        layout: RepoLayout,
        config: RepoConfig,
        objects: Arc<FsObjectStore>,
        head: Arc<HeadSnapshot>,
        stage: StagingArea,
    ) -> Self {
        let worktree = FsWorkingTree::new(layout.root(), sprig_index::META_DIR);
        Self {
            layout,
            config,
            objects,
            head,
            worktree,
            stage,
        }
    }

    // ---- Accessors ----

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn staging_area(&self) -> &StagingArea {
        &self.stage
    }

    pub fn head_id(&self) -> SdkResult<ObjectId> {
        Ok(self.head.head_id()?)
    }

    pub fn head_commit(&self) -> SdkResult<Commit> {
        Ok(self.head.head_commit()?)
    }

    pub fn snapshot(&self) -> SdkResult<Snapshot> {
        Ok(self.head.current_snapshot()?)
    }

    // ---- Staging ----

    /// Stage every path in `paths`.
    ///
    /// All files are read before anything is staged: if any is missing the
    /// call fails with [`StageError::NotFound`] and no path is staged.
    pub fn add(&mut self, paths: &[RepoPath]) -> SdkResult<Vec<(RepoPath, AddOutcome)>> {
        let mut contents = Vec::with_capacity(paths.len());
        for path in paths {
            let content = self
                .worktree
                .read(path)?
                .ok_or_else(|| StageError::NotFound(path.clone()))?;
            contents.push((path, content));
        }

        let mut outcomes = Vec::with_capacity(contents.len());
        for (path, content) in contents {
            let outcome = self.stage.add(path, &content)?;
            debug!(%path, ?outcome, "add");
            outcomes.push((path.clone(), outcome));
        }
        Ok(outcomes)
    }

    /// Unstage `path`, or stage a tracked `path` for removal and delete it
    /// from the working tree.
    pub fn remove(&mut self, path: &RepoPath) -> SdkResult<RemoveOutcome> {
        let head = self.head.current_snapshot()?;
        if let Some(committed) = head.get(path) {
            self.stage.stage_removal(path, committed)?;
            self.worktree.remove(path)?;
            info!(%path, "staged for removal");
            return Ok(RemoveOutcome::StagedForRemoval);
        }

        if self.stage.unstage_addition(path)? {
            return Ok(RemoveOutcome::Unstaged);
        }
        Err(SdkError::NothingToRemove(path.clone()))
    }

    // ---- Commit ----

    /// Record the staged state as a new commit on top of HEAD.
    pub fn commit(&mut self, message: &str) -> SdkResult<CommitSummary> {
        if message.trim().is_empty() {
            return Err(SdkError::EmptyMessage);
        }
        if self.stage.is_empty()? {
            return Err(SdkError::NothingToCommit);
        }

        let parent_id = self.head.head_id()?;
        let mut files = self.head.head_commit()?.files;

        let removals = self.stage.staged_removal_paths()?;
        for path in &removals {
            files.remove(path);
        }

        let additions = self.stage.staged_addition_paths();
        for path in &additions {
            let content = self
                .stage
                .staged_addition(path)?
                .ok_or_else(|| StageError::from(PersistenceError::MissingContent(path.clone())))?;
            let blob = self.objects.write(&StoredObject::blob(content.into_bytes()))?;
            files.insert(path.clone(), blob);
        }

        let commit = Commit {
            parent: Some(parent_id),
            message: message.to_string(),
            timestamp: Utc::now(),
            files,
        };
        let id = self.objects.write(&commit.to_stored_object()?)?;
        sprig_store::fs::write_atomic(self.head.head_file(), id.to_hex().as_bytes())?;

        self.stage.clear_additions()?;
        self.stage.clear_removals()?;

        info!(commit = %id.short_hex(), added = additions.len(), removed = removals.len(), "committed");
        Ok(CommitSummary {
            id,
            message: commit.message,
            added: additions.len(),
            removed: removals.len(),
        })
    }

    // ---- Status ----

    pub fn status(&self) -> SdkResult<Status> {
        let head = self.head.current_snapshot()?;
        let staged = self.stage.staged_addition_paths();
        let removed = self.stage.staged_removal_paths()?;
        let files = self.worktree.list()?;

        let mut status = Status::new();
        status.staged = staged.iter().cloned().collect();
        status.removed = removed.iter().cloned().collect();

        for (path, committed) in head.iter() {
            if removed.contains(path) {
                continue;
            }
            match self.worktree.read(path)? {
                None => status.deleted.push(path.clone()),
                Some(working) => {
                    let expected = self.expected_content(path, committed)?;
                    if working != expected {
                        status.modified.push(path.clone());
                    }
                }
            }
        }

        for path in &staged {
            if head.contains(path) {
                continue;
            }
            match self.worktree.read(path)? {
                None => status.deleted.push(path.clone()),
                Some(working) => {
                    if Some(&working) != self.stage.staged_addition(path)?.as_ref() {
                        status.modified.push(path.clone());
                    }
                }
            }
        }

        status.untracked = files
            .into_iter()
            .filter(|p| !head.contains(p) && !staged.contains(p))
            .collect();
        status.modified.sort();
        status.deleted.sort();
        Ok(status)
    }

    /// What the next commit would record for a tracked path.
    fn expected_content(&self, path: &RepoPath, committed: &Content) -> SdkResult<Content> {
        Ok(self
            .stage
            .staged_addition(path)?
            .unwrap_or_else(|| committed.clone()))
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.layout.root())
            .field("stage", &self.stage)
            .finish()
    }
}
