//! Commit records.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use sprig_store::{ObjectKind, ObjectStore, StoreError, StoreResult, StoredObject};
use sprig_types::{ObjectId, RepoPath};

/// One commit: a parent link, metadata, and the blob id of every file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub parent: Option<ObjectId>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub files: BTreeMap<RepoPath, ObjectId>,
}

impl Commit {
    /// The root commit every repository starts from.
    pub fn initial() -> Self {
        Self {
            parent: None,
            message: "initial commit".into(),
            timestamp: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
            files: BTreeMap::new(),
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data = bincode::serialize(self).map_err(|e| StoreError::CorruptObject {
            id: ObjectId::null(),
            reason: format!("failed to serialize commit: {e}"),
        })?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    /// Read and decode the commit `id` from `store`.
    pub fn load(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<Self> {
        let object = store.read(id)?.ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: "commit object missing".into(),
        })?;
        if object.kind != ObjectKind::Commit {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: format!("expected commit, got {}", object.kind),
            });
        }
        bincode::deserialize(&object.data).map_err(|e| StoreError::CorruptObject {
            id: *id,
            reason: e.to_string(),
        })
    }
}

/// What a successful commit produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub id: ObjectId,
    pub message: String,
    pub added: usize,
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_store::InMemoryObjectStore;

    #[test]
    fn initial_commit_is_stable() {
        let a = Commit::initial().to_stored_object().unwrap().compute_id();
        let b = Commit::initial().to_stored_object().unwrap().compute_id();
        assert_eq!(a, b);
        assert_eq!(Commit::initial().timestamp.timestamp(), 0);
    }

    #[test]
    fn store_and_load() {
        let store = InMemoryObjectStore::new();
        let mut commit = Commit::initial();
        commit.message = "second".into();
        commit
            .files
            .insert(RepoPath::new("a.txt").unwrap(), ObjectId::from_hash([7; 32]));

        let id = store.write(&commit.to_stored_object().unwrap()).unwrap();
        assert_eq!(Commit::load(&store, &id).unwrap(), commit);
    }

    #[test]
    fn load_rejects_blob() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&StoredObject::blob(b"not a commit".to_vec())).unwrap();
        assert!(matches!(
            Commit::load(&store, &id),
            Err(StoreError::CorruptObject { .. })
        ));
    }
}
