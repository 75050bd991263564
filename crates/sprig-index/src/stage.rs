//! The staging area: reconciles `add` requests against HEAD and the pending
//! removals, and owns the durable staged state.
//!
//! Three artifacts back a staging area:
//!
//! - the *addition overlay*: path → content staged for the next commit
//! - the *removal overlay*: path → content staged for removal
//! - the *addition index*: the set of paths staged for addition
//!
//! The addition index is authoritative. Staging writes content before the
//! index, unstaging rewrites the index before deleting content, so an
//! interrupted operation can only leave behind overlay files the index does
//! not list. Those orphans are pruned when the staging area is opened.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use sprig_store::{
    FsOverlay, FsRecord, InMemoryOverlay, InMemoryRecord, OverlayStore, RecordStore,
    SnapshotProvider, StoreResult, WorkingTree,
};
use sprig_types::{Content, RepoPath};

use crate::config::{RemovalUndo, RepoLayout, StagingConfig};
use crate::error::{PersistenceError, StageError, StageResult};
use crate::record;

/// What an [`StagingArea::add`] call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// The content was staged (new path or replaced content).
    Staged,
    /// The content matches HEAD and a previously staged copy was dropped.
    Unstaged,
    /// The content matches HEAD and nothing was staged.
    Unchanged,
    /// The content matches what was staged for removal; `cleared` pending
    /// removals were cancelled.
    RemovalUndone { cleared: usize },
}

/// The durable artifacts behind a staging area.
pub struct StagingStores {
    pub additions: Box<dyn OverlayStore>,
    pub removals: Box<dyn OverlayStore>,
    pub record: Box<dyn RecordStore>,
    /// Human-readable location, used in error messages.
    pub location: String,
}

impl StagingStores {
    /// Volatile stores for tests and embedding.
    pub fn in_memory() -> Self {
        Self {
            additions: Box::new(InMemoryOverlay::new()),
            removals: Box::new(InMemoryOverlay::new()),
            record: Box::new(InMemoryRecord::new()),
            location: "<memory>".into(),
        }
    }

    /// Stores at the fixed locations of a repository layout.
    pub fn on_disk(layout: &RepoLayout) -> StoreResult<Self> {
        Ok(Self {
            additions: Box::new(FsOverlay::open(layout.stage_dir())?),
            removals: Box::new(FsOverlay::open(layout.removal_dir())?),
            record: Box::new(FsRecord::new(layout.index_file())),
            location: layout.meta_dir().display().to_string(),
        })
    }
}

/// The staging area between the working tree and the next commit.
pub struct StagingArea {
    stores: StagingStores,
    snapshot: Arc<dyn SnapshotProvider>,
    removal_undo: RemovalUndo,
    /// In-memory copy of the persisted addition index.
    index: BTreeSet<RepoPath>,
}

impl std::fmt::Debug for StagingArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingArea")
            .field("location", &self.stores.location)
            .field("removal_undo", &self.removal_undo)
            .field("staged", &self.index.len())
            .finish()
    }
}

impl StagingArea {
    // ---------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------

    /// Create an empty staging area, or open the existing one if the stores
    /// already hold an index record.
    pub fn init(
        stores: StagingStores,
        snapshot: Arc<dyn SnapshotProvider>,
        removal_undo: RemovalUndo,
    ) -> StageResult<Self> {
        if stores.record.load()?.is_some() {
            return Self::open(stores, snapshot, removal_undo);
        }

        stores.additions.clear()?;
        stores.removals.clear()?;
        stores.record.store(&record::encode(&BTreeSet::new())?)?;
        info!(location = %stores.location, "staging area initialized");

        Ok(Self {
            stores,
            snapshot,
            removal_undo,
            index: BTreeSet::new(),
        })
    }

    /// Open an existing staging area.
    ///
    /// Fails with [`StageError::NotInitialized`] if no index record exists and
    /// with [`StageError::Persistence`] if the record is corrupt or lists a
    /// path whose staged content is missing.
    pub fn open(
        stores: StagingStores,
        snapshot: Arc<dyn SnapshotProvider>,
        removal_undo: RemovalUndo,
    ) -> StageResult<Self> {
        let bytes = stores
            .record
            .load()?
            .ok_or_else(|| StageError::NotInitialized(stores.location.clone()))?;
        let index = record::decode(&bytes)?;

        let on_disk = stores.additions.paths()?;
        for orphan in on_disk.difference(&index) {
            warn!(path = %orphan, "pruning staged content not listed in the index");
            stores.additions.remove(orphan)?;
        }
        if let Some(missing) = index.difference(&on_disk).next() {
            return Err(PersistenceError::MissingContent(missing.clone()).into());
        }

        debug!(location = %stores.location, staged = index.len(), "staging area opened");
        Ok(Self {
            stores,
            snapshot,
            removal_undo,
            index,
        })
    }

    /// Initialize the on-disk staging area described by `config`.
    pub fn init_at(config: &StagingConfig, snapshot: Arc<dyn SnapshotProvider>) -> StageResult<Self> {
        Self::init(StagingStores::on_disk(&config.layout)?, snapshot, config.removal_undo)
    }

    /// Open the on-disk staging area described by `config`.
    pub fn open_at(config: &StagingConfig, snapshot: Arc<dyn SnapshotProvider>) -> StageResult<Self> {
        if !config.layout.is_initialized() {
            return Err(StageError::NotInitialized(
                config.layout.meta_dir().display().to_string(),
            ));
        }
        Self::open(StagingStores::on_disk(&config.layout)?, snapshot, config.removal_undo)
    }

    // ---------------------------------------------------------------
    // Add
    // ---------------------------------------------------------------

    /// Reconcile `working` (the current bytes of `path`) into the staged state.
    ///
    /// 1. Path committed and staged for removal with exactly this content:
    ///    cancel the removal (the whole batch under [`RemovalUndo::Batch`]).
    /// 2. Path committed with exactly this content: drop any staged copy.
    /// 3. Otherwise: stage the content.
    ///
    /// Staging under rule 3 also drops a pending removal of the same path,
    /// so the two overlays never share a path. Re-adding a removed file with
    /// different content therefore replaces its removal with an addition.
    pub fn add(&mut self, path: &RepoPath, working: &Content) -> StageResult<AddOutcome> {
        let head = self.snapshot.current_snapshot()?;

        if let Some(committed) = head.get(path) {
            if let Some(removed) = self.stores.removals.get(path)? {
                if removed == *working {
                    let cleared = self.undo_removal(path)?;
                    return Ok(AddOutcome::RemovalUndone { cleared });
                }
            }
            if committed == working {
                return self.unstage(path);
            }
        }

        self.stage(path, working)
    }

    /// Read `path` from the working tree and [`add`](Self::add) it.
    ///
    /// A missing file fails with [`StageError::NotFound`] before anything is
    /// touched.
    pub fn add_from_worktree(
        &mut self,
        path: &RepoPath,
        tree: &dyn WorkingTree,
    ) -> StageResult<AddOutcome> {
        let working = tree
            .read(path)?
            .ok_or_else(|| StageError::NotFound(path.clone()))?;
        self.add(path, &working)
    }

    fn stage(&mut self, path: &RepoPath, content: &Content) -> StageResult<AddOutcome> {
        self.stores.additions.put(path, content)?;
        if !self.index.contains(path) {
            let mut next = self.index.clone();
            next.insert(path.clone());
            self.persist_index(next)?;
        }

        // A path is never staged for addition and removal at once.
        if self.stores.removals.remove(path)? {
            debug!(%path, "dropped pending removal of re-staged path");
        }

        debug!(%path, id = %content.object_id(), "staged");
        Ok(AddOutcome::Staged)
    }

    fn unstage(&mut self, path: &RepoPath) -> StageResult<AddOutcome> {
        let was_staged = self.index.contains(path);
        if was_staged {
            let mut next = self.index.clone();
            next.remove(path);
            self.persist_index(next)?;
        }
        self.stores.additions.remove(path)?;

        if was_staged {
            debug!(%path, "unstaged: content matches HEAD");
            Ok(AddOutcome::Unstaged)
        } else {
            Ok(AddOutcome::Unchanged)
        }
    }

    fn undo_removal(&mut self, path: &RepoPath) -> StageResult<usize> {
        let cleared = match self.removal_undo {
            RemovalUndo::Batch => self.stores.removals.clear()?,
            RemovalUndo::Path => usize::from(self.stores.removals.remove(path)?),
        };
        info!(%path, cleared, policy = ?self.removal_undo, "removal undone");
        Ok(cleared)
    }

    fn persist_index(&mut self, next: BTreeSet<RepoPath>) -> StageResult<()> {
        self.stores.record.store(&record::encode(&next)?)?;
        self.index = next;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Removals
    // ---------------------------------------------------------------

    /// Record `content` as staged for removal at `path`.
    ///
    /// Any pending addition of the same path is dropped first. Returns
    /// `true` if an addition was dropped.
    pub fn stage_removal(&mut self, path: &RepoPath, content: &Content) -> StageResult<bool> {
        let dropped = self.unstage(path)? == AddOutcome::Unstaged;
        self.stores.removals.put(path, content)?;
        debug!(%path, dropped, "staged for removal");
        Ok(dropped)
    }

    /// Drop a pending addition without touching removals.
    ///
    /// Returns `true` if the path was staged.
    pub fn unstage_addition(&mut self, path: &RepoPath) -> StageResult<bool> {
        Ok(self.unstage(path)? == AddOutcome::Unstaged)
    }

    // ---------------------------------------------------------------
    // Clear
    // ---------------------------------------------------------------

    /// Forget every staged addition. Idempotent.
    pub fn clear_additions(&mut self) -> StageResult<()> {
        if !self.index.is_empty() {
            self.persist_index(BTreeSet::new())?;
        }
        let removed = self.stores.additions.clear()?;
        debug!(removed, "additions cleared");
        Ok(())
    }

    /// Forget every staged removal. Idempotent.
    pub fn clear_removals(&mut self) -> StageResult<()> {
        let removed = self.stores.removals.clear()?;
        debug!(removed, "removals cleared");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Paths staged for addition (an owned copy of the index).
    pub fn staged_addition_paths(&self) -> BTreeSet<RepoPath> {
        self.index.clone()
    }

    /// Content staged for addition at `path`.
    pub fn staged_addition(&self, path: &RepoPath) -> StageResult<Option<Content>> {
        if !self.index.contains(path) {
            return Ok(None);
        }
        match self.stores.additions.get(path)? {
            Some(content) => Ok(Some(content)),
            None => Err(PersistenceError::MissingContent(path.clone()).into()),
        }
    }

    /// Paths staged for removal.
    pub fn staged_removal_paths(&self) -> StageResult<BTreeSet<RepoPath>> {
        Ok(self.stores.removals.paths()?)
    }

    /// Content staged for removal at `path`.
    pub fn staged_removal(&self, path: &RepoPath) -> StageResult<Option<Content>> {
        Ok(self.stores.removals.get(path)?)
    }

    /// Returns `true` if nothing is staged for addition or removal.
    pub fn is_empty(&self) -> StageResult<bool> {
        Ok(self.index.is_empty() && self.stores.removals.is_empty()?)
    }

    pub fn removal_undo(&self) -> RemovalUndo {
        self.removal_undo
    }
}
