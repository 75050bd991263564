//! In-memory backends for tests and embedding.
//!
//! State lives in `BTreeMap`s behind `RwLock`s and is lost when the value is
//! dropped.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use sprig_types::{Content, ObjectId, RepoPath};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::{ObjectStore, OverlayStore, RecordStore, WorkingTree};

/// In-memory [`OverlayStore`].
#[derive(Debug, Default)]
pub struct InMemoryOverlay {
    entries: RwLock<BTreeMap<RepoPath, Content>>,
}

impl InMemoryOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an overlay pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = (RepoPath, Content)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Copy of the full contents, for assertions.
    pub fn to_map(&self) -> BTreeMap<RepoPath, Content> {
        self.entries.read().expect("lock poisoned").clone()
    }
}

impl OverlayStore for InMemoryOverlay {
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        Ok(self.entries.read().expect("lock poisoned").get(path).cloned())
    }

    fn put(&self, path: &RepoPath, content: &Content) -> StoreResult<()> {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(path.clone(), content.clone());
        Ok(())
    }

    fn remove(&self, path: &RepoPath) -> StoreResult<bool> {
        Ok(self
            .entries
            .write()
            .expect("lock poisoned")
            .remove(path)
            .is_some())
    }

    fn paths(&self) -> StoreResult<BTreeSet<RepoPath>> {
        Ok(self
            .entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }

    fn clear(&self) -> StoreResult<usize> {
        let mut map = self.entries.write().expect("lock poisoned");
        let count = map.len();
        map.clear();
        Ok(count)
    }
}

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct InMemoryRecord {
    bytes: RwLock<Option<Vec<u8>>>,
}

impl InMemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecord {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.bytes.read().expect("lock poisoned").clone())
    }

    fn store(&self, bytes: &[u8]) -> StoreResult<()> {
        *self.bytes.write().expect("lock poisoned") = Some(bytes.to_vec());
        Ok(())
    }
}

/// In-memory [`ObjectStore`].
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.objects.read().expect("lock poisoned").get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert_with(|| object.clone());
        Ok(id)
    }
}

/// In-memory [`WorkingTree`].
#[derive(Debug, Default)]
pub struct InMemoryWorkingTree {
    files: RwLock<BTreeMap<RepoPath, Content>>,
}

impl InMemoryWorkingTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a working file.
    pub fn write(&self, path: &RepoPath, content: impl Into<Content>) {
        self.files
            .write()
            .expect("lock poisoned")
            .insert(path.clone(), content.into());
    }
}

impl WorkingTree for InMemoryWorkingTree {
    fn read(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        Ok(self.files.read().expect("lock poisoned").get(path).cloned())
    }

    fn remove(&self, path: &RepoPath) -> StoreResult<bool> {
        Ok(self
            .files
            .write()
            .expect("lock poisoned")
            .remove(path)
            .is_some())
    }

    fn list(&self) -> StoreResult<BTreeSet<RepoPath>> {
        Ok(self
            .files
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect())
    }
}
