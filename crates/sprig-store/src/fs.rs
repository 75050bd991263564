//! Filesystem backends.
//!
//! Every write lands in a temporary file in the destination directory and
//! is renamed over the target, so a reader never observes a half-written
//! file.
//!
//! Overlay entries live flat in one directory, named by the hex of the
//! path's [`ContentHasher::PATH`] hash. The file name length is fixed
//! whatever the path length; the path itself is kept in the entry header:
//!
//! ```text
//! [4 bytes: path length (little-endian u32)]
//! [N bytes: path, UTF-8]
//! [rest:    content bytes]
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use sprig_types::{Content, ContentHasher, ObjectId, RepoPath};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::{ObjectStore, OverlayStore, RecordStore, WorkingTree};

/// Write `bytes` to `path` through a temp file + rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_optional(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// Longest path an overlay entry header may declare.
const MAX_ENTRY_PATH: usize = 64 * 1024;

/// Directory-backed [`OverlayStore`]: one file per path.
#[derive(Clone, Debug)]
pub struct FsOverlay {
    dir: PathBuf,
}

impl FsOverlay {
    /// Open (or create) the overlay directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, path: &RepoPath) -> PathBuf {
        self.dir
            .join(ContentHasher::PATH.hash(path.as_str().as_bytes()).to_hex())
    }

    fn encode_entry(path: &RepoPath, content: &Content) -> Vec<u8> {
        let name = path.as_str().as_bytes();
        let mut out = Vec::with_capacity(4 + name.len() + content.len());
        out.extend_from_slice(&(name.len() as u32).to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(content.as_bytes());
        out
    }

    /// Split an entry into its header path and content.
    fn decode_entry(file: &Path, bytes: &[u8]) -> StoreResult<(RepoPath, Content)> {
        let corrupt = |reason: &str| StoreError::CorruptEntry {
            path: file.to_path_buf(),
            reason: reason.to_string(),
        };
        if bytes.len() < 4 {
            return Err(corrupt("entry header truncated"));
        }
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if len > MAX_ENTRY_PATH || bytes.len() < 4 + len {
            return Err(corrupt("entry path truncated"));
        }
        let text = std::str::from_utf8(&bytes[4..4 + len])
            .map_err(|_| corrupt("entry path is not UTF-8"))?;
        let path = RepoPath::new(text)?;
        Ok((path, Content::new(bytes[4 + len..].to_vec())))
    }

    /// Read only the header path of an entry file.
    fn read_entry_path(file: &Path) -> StoreResult<RepoPath> {
        let corrupt = |reason: &str| StoreError::CorruptEntry {
            path: file.to_path_buf(),
            reason: reason.to_string(),
        };
        let mut reader = fs::File::open(file)?;
        let mut len = [0u8; 4];
        reader
            .read_exact(&mut len)
            .map_err(|_| corrupt("entry header truncated"))?;
        let len = u32::from_le_bytes(len) as usize;
        if len > MAX_ENTRY_PATH {
            return Err(corrupt("entry path too long"));
        }
        let mut name = vec![0u8; len];
        reader
            .read_exact(&mut name)
            .map_err(|_| corrupt("entry path truncated"))?;
        let text = String::from_utf8(name).map_err(|_| corrupt("entry path is not UTF-8"))?;
        Ok(RepoPath::new(text)?)
    }

    /// Entry files in the directory, skipping in-flight temp files and
    /// anything whose name does not match the path in its header.
    fn entries(&self) -> StoreResult<Vec<(PathBuf, RepoPath)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file = entry.path();
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(?file, "skipping non-UTF-8 overlay entry");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Ok(id) = ObjectId::from_hex(name) else {
                warn!(?file, "skipping unrecognized overlay entry");
                continue;
            };
            match Self::read_entry_path(&file) {
                Ok(path) if ContentHasher::PATH.verify(path.as_str().as_bytes(), &id) => {
                    out.push((file, path))
                }
                Ok(path) => warn!(?file, %path, "skipping overlay entry filed under the wrong name"),
                Err(StoreError::Io(e)) => return Err(StoreError::Io(e)),
                Err(e) => warn!(?file, error = %e, "skipping corrupt overlay entry"),
            }
        }
        Ok(out)
    }
}

impl OverlayStore for FsOverlay {
    fn get(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        let file = self.entry_path(path);
        let Some(bytes) = read_optional(&file)? else {
            return Ok(None);
        };
        let (stored, content) = Self::decode_entry(&file, &bytes)?;
        if stored != *path {
            return Err(StoreError::CorruptEntry {
                path: file,
                reason: format!("entry holds {stored}, expected {path}"),
            });
        }
        Ok(Some(content))
    }

    fn put(&self, path: &RepoPath, content: &Content) -> StoreResult<()> {
        write_atomic(&self.entry_path(path), &Self::encode_entry(path, content))?;
        debug!(dir = ?self.dir, %path, len = content.len(), "overlay put");
        Ok(())
    }

    fn remove(&self, path: &RepoPath) -> StoreResult<bool> {
        let existed = remove_optional(&self.entry_path(path))?;
        if existed {
            debug!(dir = ?self.dir, %path, "overlay remove");
        }
        Ok(existed)
    }

    fn paths(&self) -> StoreResult<BTreeSet<RepoPath>> {
        Ok(self.entries()?.into_iter().map(|(_, p)| p).collect())
    }

    fn clear(&self) -> StoreResult<usize> {
        let mut removed = 0;
        for (file, _) in self.entries()? {
            if remove_optional(&file)? {
                removed += 1;
            }
        }
        debug!(dir = ?self.dir, removed, "overlay cleared");
        Ok(removed)
    }

    fn contains(&self, path: &RepoPath) -> StoreResult<bool> {
        Ok(self.entry_path(path).is_file())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Single-file [`RecordStore`].
#[derive(Clone, Debug)]
pub struct FsRecord {
    path: PathBuf,
}

impl FsRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for FsRecord {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        read_optional(&self.path)
    }

    fn store(&self, bytes: &[u8]) -> StoreResult<()> {
        write_atomic(&self.path, bytes)
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Directory-backed [`ObjectStore`]: `<dir>/<hex id>`.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    dir: PathBuf,
}

impl FsObjectStore {
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.dir.join(id.to_hex())
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        match read_optional(&self.object_path(id))? {
            Some(bytes) => Ok(Some(StoredObject::decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let path = self.object_path(&id);
        if !path.exists() {
            write_atomic(&path, &object.encode())?;
            debug!(%id, kind = %object.kind, len = object.data.len(), "object written");
        }
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

// ---------------------------------------------------------------------------
// Working tree
// ---------------------------------------------------------------------------

/// The user's files under a working root.
#[derive(Clone, Debug)]
pub struct FsWorkingTree {
    root: PathBuf,
    /// Top-level directory name excluded from listings (repository metadata).
    meta_dir: String,
}

impl FsWorkingTree {
    pub fn new(root: impl Into<PathBuf>, meta_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            meta_dir: meta_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl WorkingTree for FsWorkingTree {
    fn read(&self, path: &RepoPath) -> StoreResult<Option<Content>> {
        let fs_path = path.to_fs_path(&self.root);
        if !fs_path.is_file() {
            return Ok(None);
        }
        Ok(read_optional(&fs_path)?.map(Content::new))
    }

    fn remove(&self, path: &RepoPath) -> StoreResult<bool> {
        remove_optional(&path.to_fs_path(&self.root))
    }

    fn list(&self) -> StoreResult<BTreeSet<RepoPath>> {
        let mut out = BTreeSet::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == self.meta_dir.as_str()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "directory walk failed")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|_| StoreError::CorruptEntry {
                    path: entry.path().to_path_buf(),
                    reason: "outside working root".into(),
                })?;
            match RepoPath::from_relative(rel) {
                Ok(p) => {
                    out.insert(p);
                }
                Err(e) => warn!(file = ?entry.path(), error = %e, "skipping unrepresentable path"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    #[test]
    fn overlay_persists_across_handles() {
        let dir = tempfile::tempdir().unwrap();
        let p = path("nested/dir/file.bin");
        let bytes = Content::new(vec![0u8, 159, 146, 150, b'\r', b'\n']);

        FsOverlay::open(dir.path().join("stage"))
            .unwrap()
            .put(&p, &bytes)
            .unwrap();

        let reopened = FsOverlay::open(dir.path().join("stage")).unwrap();
        assert_eq!(reopened.get(&p).unwrap(), Some(bytes));
        assert_eq!(reopened.paths().unwrap(), BTreeSet::from([p]));
    }

    #[test]
    fn overlay_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = FsOverlay::open(dir.path()).unwrap();
        fs::write(dir.path().join(".tmpXYZ"), b"in flight").unwrap();
        fs::write(dir.path().join("not-hex!"), b"junk").unwrap();

        overlay.put(&path("a.txt"), &Content::from("a")).unwrap();
        assert_eq!(overlay.paths().unwrap().len(), 1);
        assert_eq!(overlay.clear().unwrap(), 1);
        assert!(dir.path().join("not-hex!").exists());
    }

    #[test]
    fn overlay_stores_paths_longer_than_a_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let long = path(&format!("src/{}/{}/file.rs", "a".repeat(200), "b".repeat(200)));
        assert!(long.as_str().len() > 255);

        FsOverlay::open(dir.path())
            .unwrap()
            .put(&long, &Content::from("deep"))
            .unwrap();

        let reopened = FsOverlay::open(dir.path()).unwrap();
        assert_eq!(reopened.get(&long).unwrap(), Some(Content::from("deep")));
        assert_eq!(reopened.paths().unwrap(), BTreeSet::from([long]));
    }

    #[test]
    fn overlay_skips_entry_filed_under_another_name() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = FsOverlay::open(dir.path()).unwrap();
        overlay.put(&path("a.txt"), &Content::from("a")).unwrap();

        let copied = ContentHasher::PATH.hash(b"b.txt").to_hex();
        fs::copy(overlay.entry_path(&path("a.txt")), dir.path().join(&copied)).unwrap();
        fs::write(dir.path().join(ContentHasher::PATH.hash(b"c").to_hex()), [9u8, 0]).unwrap();

        assert_eq!(overlay.paths().unwrap(), BTreeSet::from([path("a.txt")]));
        assert!(matches!(
            overlay.get(&path("b.txt")),
            Err(StoreError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn overlay_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let overlay = FsOverlay::open(dir.path()).unwrap();
        overlay.put(&path("a"), &Content::from("1")).unwrap();
        overlay.put(&path("b"), &Content::from("2")).unwrap();

        assert!(overlay.remove(&path("a")).unwrap());
        assert!(!overlay.remove(&path("a")).unwrap());
        assert!(!overlay.contains(&path("a")).unwrap());
        assert_eq!(overlay.clear().unwrap(), 1);
        assert!(overlay.is_empty().unwrap());
    }

    #[test]
    fn record_replace() {
        let dir = tempfile::tempdir().unwrap();
        let record = FsRecord::new(dir.path().join("staged_save"));
        assert_eq!(record.load().unwrap(), None);
        record.store(b"first").unwrap();
        record.store(b"second").unwrap();
        assert_eq!(record.load().unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn object_store_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        let obj = StoredObject::blob(b"blob bytes".to_vec());
        let id = store.write(&obj).unwrap();
        assert_eq!(store.read(&id).unwrap(), Some(obj));

        fs::write(dir.path().join(id.to_hex()), b"bnot the same").unwrap();
        assert!(matches!(
            store.read(&id),
            Err(StoreError::HashMismatch { .. })
        ));
    }

    #[test]
    fn working_tree_lists_files_and_skips_meta_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".sprig/stage")).unwrap();
        fs::write(dir.path().join(".sprig/HEAD"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), b"fn main() {}").unwrap();
        fs::write(dir.path().join("README"), b"hi").unwrap();

        let tree = FsWorkingTree::new(dir.path(), ".sprig");
        let listed: Vec<String> = tree
            .list()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(listed, vec!["README".to_string(), "src/main.rs".to_string()]);

        assert_eq!(
            tree.read(&path("README")).unwrap(),
            Some(Content::from("hi"))
        );
        assert_eq!(tree.read(&path("src")).unwrap(), None);
        assert!(tree.remove(&path("README")).unwrap());
        assert_eq!(tree.read(&path("README")).unwrap(), None);
    }
}
