//! Storage seams for sprig.
//!
//! The staging area and the commit logic never touch the filesystem
//! directly; they talk to the traits defined here. Every trait has an
//! in-memory backend for tests and embedding and a filesystem backend used
//! by a real repository.
//!
//! # Traits
//!
//! - [`ContentStore`]: committed content by path
//! - [`SnapshotProvider`]: the checked-out commit's full path → content map
//! - [`WorkingTree`]: the user's files on disk
//! - [`OverlayStore`]: a mutable path → content map (staged additions/removals)
//! - [`RecordStore`]: a single opaque, atomically replaced byte record
//! - [`ObjectStore`]: content-addressed objects (blobs, commit records)
//!
//! # Design Rules
//!
//! 1. Content bytes are stored verbatim; no text encoding is assumed.
//! 2. Filesystem writes go to a temporary file and are renamed into place.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FsObjectStore, FsOverlay, FsRecord, FsWorkingTree};
pub use memory::{InMemoryObjectStore, InMemoryOverlay, InMemoryRecord, InMemoryWorkingTree};
pub use object::{ObjectKind, StoredObject};
pub use traits::{ContentStore, ObjectStore, OverlayStore, RecordStore, SnapshotProvider, WorkingTree};
