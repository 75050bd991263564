//! The checked-out commit, resolved to file content.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::debug;

use sprig_store::{ContentStore, ObjectStore, SnapshotProvider, StoreError, StoreResult};
use sprig_types::{Content, ObjectId, RepoPath, Snapshot};

use crate::commit::Commit;

/// Reads `.sprig/HEAD` and resolves the commit it names against the object
/// store.
///
/// Every call re-reads HEAD, so a commit made through the same repository
/// handle is visible to the next `add`. The resolved snapshot is kept until
/// HEAD names a different commit; repeated lookups against an unchanged HEAD
/// read no objects.
pub struct HeadSnapshot {
    head_file: PathBuf,
    objects: Arc<dyn ObjectStore>,
    resolved: RwLock<Option<(ObjectId, Arc<Snapshot>)>>,
}

impl HeadSnapshot {
    pub fn new(head_file: impl Into<PathBuf>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            head_file: head_file.into(),
            objects,
            resolved: RwLock::new(None),
        }
    }

    pub fn head_file(&self) -> &Path {
        &self.head_file
    }

    /// Id of the checked-out commit.
    pub fn head_id(&self) -> StoreResult<ObjectId> {
        let text = fs::read_to_string(&self.head_file)?;
        ObjectId::from_hex(&text).map_err(|e| StoreError::CorruptEntry {
            path: self.head_file.clone(),
            reason: e.to_string(),
        })
    }

    pub fn head_commit(&self) -> StoreResult<Commit> {
        Commit::load(self.objects.as_ref(), &self.head_id()?)
    }

    fn read_blob(&self, id: &ObjectId) -> StoreResult<Content> {
        let object = self.objects.read(id)?.ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: "blob referenced by HEAD is missing".into(),
        })?;
        Ok(Content::new(object.data))
    }

    /// The snapshot of the current HEAD, resolved at most once per commit.
    fn resolve(&self) -> StoreResult<Arc<Snapshot>> {
        let id = self.head_id()?;
        if let Some((cached, snapshot)) = &*self.resolved.read().expect("lock poisoned") {
            if *cached == id {
                return Ok(Arc::clone(snapshot));
            }
        }

        let commit = Commit::load(self.objects.as_ref(), &id)?;
        let snapshot: Snapshot = commit
            .files
            .iter()
            .map(|(path, blob)| self.read_blob(blob).map(|content| (path.clone(), content)))
            .collect::<StoreResult<_>>()?;
        let snapshot = Arc::new(snapshot);
        debug!(commit = %id.short_hex(), files = snapshot.len(), "HEAD resolved");

        *self.resolved.write().expect("lock poisoned") = Some((id, Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

impl SnapshotProvider for HeadSnapshot {
    fn current_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::clone(&*self.resolve()?))
    }
}

impl ContentStore for HeadSnapshot {
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        Ok(self.resolve()?.get(path).cloned())
    }
}

impl std::fmt::Debug for HeadSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadSnapshot")
            .field("head_file", &self.head_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sprig_index::{AddOutcome, RemovalUndo, StagingArea, StagingStores};
    use sprig_store::{InMemoryObjectStore, StoredObject};

    /// Object store that counts reads.
    #[derive(Default)]
    struct CountingObjects {
        inner: InMemoryObjectStore,
        reads: AtomicUsize,
    }

    impl ObjectStore for CountingObjects {
        fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(id)
        }

        fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
            self.inner.write(object)
        }
    }

    fn path(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    /// A HEAD commit tracking `count` files, over a counting store.
    fn counted_head(count: usize) -> (tempfile::TempDir, Arc<HeadSnapshot>, Arc<CountingObjects>) {
        let dir = tempfile::tempdir().unwrap();
        let objects = Arc::new(CountingObjects::default());
        let mut commit = Commit::initial();
        for i in 0..count {
            let blob = objects
                .write(&StoredObject::blob(format!("v{i}").into_bytes()))
                .unwrap();
            commit.files.insert(path(&format!("f{i}.txt")), blob);
        }
        let id = objects.write(&commit.to_stored_object().unwrap()).unwrap();
        let head_file = dir.path().join("HEAD");
        fs::write(&head_file, id.to_hex()).unwrap();
        let head = Arc::new(HeadSnapshot::new(head_file, objects.clone()));
        (dir, head, objects)
    }

    fn setup() -> (tempfile::TempDir, HeadSnapshot, Arc<InMemoryObjectStore>) {
        let dir = tempfile::tempdir().unwrap();
        let objects = Arc::new(InMemoryObjectStore::new());
        let blob = objects
            .write(&StoredObject::blob(b"hello".to_vec()))
            .unwrap();

        let mut commit = Commit::initial();
        commit.files.insert(RepoPath::new("a.txt").unwrap(), blob);
        let id = objects.write(&commit.to_stored_object().unwrap()).unwrap();

        let head_file = dir.path().join("HEAD");
        fs::write(&head_file, id.to_hex()).unwrap();
        let head = HeadSnapshot::new(head_file, objects.clone());
        (dir, head, objects)
    }

    #[test]
    fn resolves_files_to_content() {
        let (_dir, head, _) = setup();
        let snap = head.current_snapshot().unwrap();
        assert_eq!(
            snap.get(&RepoPath::new("a.txt").unwrap()),
            Some(&Content::from("hello"))
        );
        assert_eq!(
            head.get(&RepoPath::new("a.txt").unwrap()).unwrap(),
            Some(Content::from("hello"))
        );
        assert_eq!(head.get(&RepoPath::new("b.txt").unwrap()).unwrap(), None);
    }

    #[test]
    fn garbage_head_is_corrupt() {
        let (_dir, head, _) = setup();
        fs::write(head.head_file(), "zzzz").unwrap();
        assert!(matches!(
            head.current_snapshot(),
            Err(StoreError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn adding_many_paths_resolves_head_once() {
        let (_dir, head, objects) = counted_head(10);
        let mut area =
            StagingArea::init(StagingStores::in_memory(), head.clone(), RemovalUndo::Batch)
                .unwrap();

        for i in 0..5 {
            let outcome = area
                .add(&path(&format!("f{i}.txt")), &Content::from(format!("edit{i}").as_str()))
                .unwrap();
            assert_eq!(outcome, AddOutcome::Staged);
        }
        area.add(&path("f7.txt"), &Content::from("v7")).unwrap();

        // One commit plus ten blobs, no matter how many paths were added.
        assert_eq!(objects.reads.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn moving_head_refreshes_the_snapshot() {
        let (_dir, head, objects) = counted_head(2);
        assert_eq!(head.current_snapshot().unwrap().len(), 2);

        let mut next = Commit::initial();
        next.message = "next".into();
        let blob = objects.write(&StoredObject::blob(b"new".to_vec())).unwrap();
        next.files.insert(path("only.txt"), blob);
        let id = objects.write(&next.to_stored_object().unwrap()).unwrap();
        fs::write(head.head_file(), id.to_hex()).unwrap();

        let snap = head.current_snapshot().unwrap();
        assert_eq!(snap.paths().cloned().collect::<Vec<_>>(), vec![path("only.txt")]);
        assert_eq!(head.get(&path("f0.txt")).unwrap(), None);
    }
}
