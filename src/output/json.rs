//! JSON output formatter for duplicate scan results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "length": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "directories_scanned": 12,
//!     "unique_files": 90,
//!     "failed_files": 0,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 5,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "BD000",
//!     "errors": []
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Common file length in bytes
    pub length: u64,
    /// Absolute paths of the identical files
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            length: group.length,
            files: group
                .files
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files discovered
    pub total_files: usize,
    /// Total size of all grouped files in bytes
    pub total_size: u64,
    /// Number of directories listed
    pub directories_scanned: usize,
    /// Files with no identical counterpart
    pub unique_files: usize,
    /// Files that could not be read
    pub failed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "BD000")
    pub exit_code_name: String,
    /// Recoverable errors, one message each
    pub errors: Vec<String>,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`] and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            directories_scanned: summary.directories_scanned,
            unique_files: summary.unique_files,
            failed_files: summary.failed_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
            errors: summary.scan_errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use bytedupe::duplicates::{DuplicateGroup, ScanSummary};
    /// use bytedupe::output::json::JsonOutput;
    /// use bytedupe::error::ExitCode;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     1024,
    ///     vec![PathBuf::from("/file1.txt"), PathBuf::from("/file2.txt")],
    /// )];
    /// let summary = ScanSummary::default();
    ///
    /// let output = JsonOutput::new(&groups, &summary, ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
