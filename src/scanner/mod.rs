//! Scanner module for directory traversal and file access.
//!
//! This module provides functionality for:
//! - Concurrent directory walking that groups regular files by length
//! - Lazily opened, exactly-once-closed file handles for content comparison
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`grouper`]: Directory traversal and length grouping (Phase 1)
//! - [`handle`]: Byte-at-a-time file access used by Phase 2
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::duplicates::TaskCoordinator;
//! use bytedupe::scanner::LengthGrouper;
//! use std::path::Path;
//!
//! let coordinator = TaskCoordinator::new(4).unwrap();
//! let scan = LengthGrouper::new(&coordinator).scan(Path::new(".")).unwrap();
//!
//! println!("{} files in {} length groups", scan.files, scan.store.len());
//! ```

pub mod grouper;
pub mod handle;

use std::path::PathBuf;

// Re-export main types
pub use grouper::{GrouperConfig, LengthGrouper, LengthScan};
pub use handle::{ByteRead, FileHandle, HandleState};

/// Recoverable errors encountered while scanning.
///
/// These never abort a run. They are reported to the observer, logged and
/// collected into the scan summary.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A subdirectory could not be listed; its subtree was skipped.
    #[error("Unreadable directory {path}: {source}")]
    UnreadableDirectory {
        /// Directory that failed to list
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file could not be inspected or read; it was excluded from grouping.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        /// File that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::UnreadableDirectory { path, .. } | Self::FileRead { path, .. } => path,
        }
    }
}
