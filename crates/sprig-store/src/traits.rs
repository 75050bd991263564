use std::collections::BTreeSet;

use sprig_types::{Content, ObjectId, RepoPath, Snapshot};

use crate::error::StoreResult;
use crate::object::StoredObject;

/// Committed content addressed by path.
pub trait ContentStore: Send + Sync {
    /// Returns `Ok(None)` if the path has no committed content.
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>>;
}

/// Source of the currently checked-out commit.
pub trait SnapshotProvider: Send + Sync {
    /// The full path → content mapping of HEAD.
    ///
    /// The returned value is an owned copy: callers may hold it across
    /// mutations of the repository without observing them.
    fn current_snapshot(&self) -> StoreResult<Snapshot>;
}

/// Read/delete access to the user's working files.
pub trait WorkingTree: Send + Sync {
    /// Current bytes of a working file. `Ok(None)` if it does not exist.
    fn read(&self, path: &RepoPath) -> StoreResult<Option<Content>>;

    /// Delete a working file. Returns `true` if the file existed.
    fn remove(&self, path: &RepoPath) -> StoreResult<bool>;

    /// Every file in the working tree, excluding repository metadata.
    fn list(&self) -> StoreResult<BTreeSet<RepoPath>>;

    fn exists(&self, path: &RepoPath) -> StoreResult<bool> {
        Ok(self.read(path)?.is_some())
    }
}

/// A mutable path → content map.
///
/// The staging area keeps one overlay for pending additions and one for
/// pending removals. `put` replaces any existing content for the path.
pub trait OverlayStore: Send + Sync {
    /// Returns `Ok(None)` if the path is not in the overlay.
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>>;

    /// Insert or overwrite the content stored for `path`.
    fn put(&self, path: &RepoPath, content: &Content) -> StoreResult<()>;

    /// Remove a path. Returns `true` if it was present.
    fn remove(&self, path: &RepoPath) -> StoreResult<bool>;

    /// All paths currently held.
    fn paths(&self) -> StoreResult<BTreeSet<RepoPath>>;

    /// Remove every entry. Returns the number of entries removed.
    fn clear(&self) -> StoreResult<usize>;

    fn contains(&self, path: &RepoPath) -> StoreResult<bool> {
        Ok(self.get(path)?.is_some())
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.paths()?.is_empty())
    }
}

/// A single opaque record, replaced as a whole on every store.
pub trait RecordStore: Send + Sync {
    /// Returns `Ok(None)` if the record has never been written.
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the record. Readers see either the old or the new bytes.
    fn store(&self, bytes: &[u8]) -> StoreResult<()>;
}

/// Content-addressed object store.
///
/// Objects are immutable once written; writing the same object twice is a
/// no-op that returns the same id.
pub trait ObjectStore: Send + Sync {
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read(id)?.is_some())
    }
}

impl ContentStore for Snapshot {
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        Ok(Snapshot::get(self, path).cloned())
    }
}

impl SnapshotProvider for Snapshot {
    fn current_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(self.clone())
    }
}
