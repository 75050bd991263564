//! Foundation types for sprig.
//!
//! Every other sprig crate depends on `sprig-types`. The types here are pure
//! values: they carry no I/O and no references to repository state.
//!
//! # Key Types
//!
//! - [`RepoPath`]: Validated path of a file relative to the working root
//! - [`Content`]: Opaque file bytes, compared only by equality
//! - [`ObjectId`]: Content-addressed identifier (domain-separated BLAKE3)
//! - [`Snapshot`]: Path → content mapping of one commit

pub mod content;
pub mod error;
pub mod object;
pub mod path;
pub mod snapshot;

pub use content::Content;
pub use error::TypeError;
pub use object::{ContentHasher, ObjectId};
pub use path::RepoPath;
pub use snapshot::Snapshot;
