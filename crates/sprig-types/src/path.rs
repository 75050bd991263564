//! Validated repository-relative file paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A file path relative to the working root, `/`-separated.
///
/// `RepoPath` is the key of every map in the staging area, so it is kept in
/// a single canonical spelling: no leading or trailing `/`, no empty,
/// `.` or `..` components, no NUL bytes, no backslashes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Validate and wrap a path string.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// Build a `RepoPath` from a filesystem path relative to the working root.
    pub fn from_relative(path: &Path) -> Result<Self, TypeError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                std::path::Component::Normal(part) => match part.to_str() {
                    Some(s) => parts.push(s),
                    None => {
                        return Err(TypeError::InvalidPath {
                            path: path.display().to_string(),
                            reason: "not valid UTF-8",
                        })
                    }
                },
                std::path::Component::CurDir => {}
                _ => {
                    return Err(TypeError::InvalidPath {
                        path: path.display().to_string(),
                        reason: "must be relative to the working root",
                    })
                }
            }
        }
        Self::new(parts.join("/"))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve this path against a working root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

fn validate(path: &str) -> Result<(), TypeError> {
    let invalid = |reason| TypeError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.contains('\0') {
        return Err(invalid("contains NUL byte"));
    }
    if path.contains('\\') {
        return Err(invalid("contains backslash"));
    }
    if path.starts_with('/') {
        return Err(invalid("must be relative to the working root"));
    }
    for part in path.split('/') {
        match part {
            "" => return Err(invalid("empty component")),
            "." | ".." => return Err(invalid("dot component")),
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoPath({:?})", self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RepoPath {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
