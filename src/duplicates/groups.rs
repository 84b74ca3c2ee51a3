//! Length groups and confirmed duplicate groups.
//!
//! # Overview
//!
//! A [`LengthGroup`] is a set of files that share the same length after
//! Phase 1. It is the unit of work handed to the content comparator.
//! A [`DuplicateGroup`] is a final result: two or more files whose contents
//! were compared byte for byte and found identical.
//!
//! # Example
//!
//! ```
//! use bytedupe::duplicates::DuplicateGroup;
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(
//!     1000,
//!     vec![PathBuf::from("/a.bin"), PathBuf::from("/b.bin"), PathBuf::from("/c.bin")],
//! );
//!
//! assert_eq!(group.len(), 3);
//! assert_eq!(group.duplicate_count(), 2);
//! assert_eq!(group.wasted_space(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::sequence::PersistentSequence;
use crate::scanner::FileHandle;

/// Files of one length that may still be duplicates of each other.
#[derive(Debug, Clone)]
pub struct LengthGroup {
    /// File length in bytes (shared by all members)
    pub length: u64,
    /// Handles of the member files
    pub members: PersistentSequence<Arc<FileHandle>>,
}

impl LengthGroup {
    /// Create a length group from its members.
    #[must_use]
    pub fn new(length: u64, members: PersistentSequence<Arc<FileHandle>>) -> Self {
        Self { length, members }
    }

    /// Build a group from paths, creating unopened handles.
    ///
    /// Useful when the candidates come from somewhere other than a
    /// directory walk.
    #[must_use]
    pub fn from_paths(length: u64, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let members = paths
            .into_iter()
            .map(|path| Arc::new(FileHandle::new(path, length)))
            .collect();
        Self { length, members }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.length * self.members.len() as u64
    }
}

/// Confirmed group of byte-identical files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// File length in bytes (shared by all files in the group)
    pub length: u64,
    /// Absolute paths of the identical files
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `length` - Common file length in bytes
    /// * `files` - Paths of the identical files
    #[must_use]
    pub fn new(length: u64, files: Vec<PathBuf>) -> Self {
        Self { length, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.length * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.length * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Check if `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }

    /// Sort the member paths so output is stable across runs.
    pub fn sort(&mut self) {
        self.files.sort();
    }
}
