//! Repository configuration stored at `.sprig/config.toml`.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sprig_index::RemovalUndo;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub staging: StagingSection,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingSection {
    /// What a restoring `add` cancels: `"batch"` or `"path"`.
    pub removal_undo: RemovalUndo,
}

impl RepoConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(SdkError::Store(e.into())),
        }
    }

    pub fn parse(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        sprig_store::fs::write_atomic(path, text.as_bytes())?;
        Ok(())
    }
}
