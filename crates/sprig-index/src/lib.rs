//! Staging area for sprig.
//!
//! Decides what `add` means for a path given the checked-out snapshot and
//! the pending removals, and keeps the staged state durable between
//! invocations.
//!
//! # Key Types
//!
//! - [`StagingArea`] -- The reconciliation logic over two content overlays
//!   and the addition index
//! - [`StagingStores`] -- The three durable artifacts backing a staging area
//! - [`StagingConfig`] / [`RepoLayout`] -- Where the artifacts live
//! - [`RemovalUndo`] -- How much of the removal batch a restoring `add` cancels
//! - [`AddOutcome`] -- What an `add` call did

pub mod config;
pub mod error;
pub mod record;
pub mod stage;

pub use config::{RemovalUndo, RepoLayout, StagingConfig, META_DIR};
pub use error::{PersistenceError, StageError, StageResult};
pub use stage::{AddOutcome, StagingArea, StagingStores};
