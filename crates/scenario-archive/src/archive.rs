//! The archive handle mutated by deployment processing stages
//!
//! An [`Archive`] is a named, typed tree of byte entries and nested archives.
//! It is never serialized to bytes here; equality and [`Archive::content_hash`]
//! are structural.

use crate::kind::ArchiveKind;
use crate::path::{ArchivePath, PathError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Errors related to archive operations
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Invalid entry or directory path
    #[error("invalid archive path: {0}")]
    InvalidPath(#[from] PathError),

    /// Entry targeted the archive root
    #[error("cannot add an entry at the root of archive '{0}'")]
    RootEntry(String),

    /// Archive name is empty or contains a path separator
    #[error("invalid archive name: '{0}'")]
    InvalidName(String),

    /// A nested archive already occupies the location
    #[error("archive '{archive}' already contains a nested archive at {path}")]
    DuplicateNested {
        /// Name of the outer archive
        archive: String,
        /// Occupied location
        path: ArchivePath,
    },
}

/// Blake3 digest of an archive's structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// First 16 hex chars, for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// In-memory deployable archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    name: String,
    kind: ArchiveKind,
    entries: BTreeMap<ArchivePath, Vec<u8>>,
    nested: BTreeMap<ArchivePath, Archive>,
}

impl Archive {
    /// Create an empty archive
    #[must_use]
    pub fn new(kind: ArchiveKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            entries: BTreeMap::new(),
            nested: BTreeMap::new(),
        }
    }

    /// Archive file name (e.g. `test.war`)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Archive kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// Add or replace a byte entry
    ///
    /// # Errors
    /// Returns error if `path` is invalid or is the archive root
    pub fn add(
        &mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
    ) -> Result<&mut Self, ArchiveError> {
        let path: ArchivePath = path.parse()?;
        if path.is_root() {
            return Err(ArchiveError::RootEntry(self.name.clone()));
        }
        self.entries.insert(path, content.into());
        Ok(self)
    }

    /// Nest another archive under `dir`, keyed by its name
    ///
    /// # Errors
    /// Returns error if `dir` is invalid or the location is taken
    pub fn add_archive(&mut self, dir: &str, archive: Archive) -> Result<&mut Self, ArchiveError> {
        let dir: ArchivePath = dir.parse()?;
        let path = dir.join(&archive.name)?;
        if self.nested.contains_key(&path) {
            return Err(ArchiveError::DuplicateNested {
                archive: self.name.clone(),
                path,
            });
        }
        self.nested.insert(path, archive);
        Ok(self)
    }

    /// Check if an entry or nested archive exists at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        path.parse::<ArchivePath>()
            .is_ok_and(|p| self.entries.contains_key(&p) || self.nested.contains_key(&p))
    }

    /// Bytes of the entry at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        let path: ArchivePath = path.parse().ok()?;
        self.entries.get(&path).map(Vec::as_slice)
    }

    /// Nested archive at `path`
    #[must_use]
    pub fn nested_archive(&self, path: &str) -> Option<&Archive> {
        let path: ArchivePath = path.parse().ok()?;
        self.nested.get(&path)
    }

    /// Structural content hash over name, kind, entries and nested archives
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        self.feed(&mut hasher);
        ContentHash(*hasher.finalize().as_bytes())
    }

    fn feed(&self, hasher: &mut blake3::Hasher) {
        hasher.update(self.kind.extension().as_bytes());
        hasher.update(&[0]);
        hasher.update(self.name.as_bytes());
        hasher.update(&[0]);
        for (path, content) in &self.entries {
            hasher.update(path.to_string().as_bytes());
            hasher.update(&(content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        for (path, archive) in &self.nested {
            hasher.update(path.to_string().as_bytes());
            hasher.update(&[1]);
            archive.feed(hasher);
        }
    }
}
