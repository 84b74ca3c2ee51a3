//! Duplicate finder orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] ties the detection pipeline together:
//!
//! 1. **Phase 1** - [`LengthGrouper`] walks the tree and groups every
//!    regular file by its length.
//! 2. **Uniques** - length groups with a single member cannot contain
//!    duplicates; those files are closed and reported right away.
//! 3. **Phase 2** - [`ContentComparator`] refines the remaining groups byte
//!    by byte until every file is resolved.
//!
//! Both phases share one [`TaskCoordinator`] pool sized by
//! [`FinderConfig::io_threads`].
//!
//! # Example
//!
//! ```no_run
//! use bytedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_io_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::comparator::ContentComparator;
use super::coordinator::TaskCoordinator;
use super::groups::{DuplicateGroup, LengthGroup};
use crate::progress::{NoopObserver, ScanObserver};
use crate::scanner::{GrouperConfig, LengthGrouper, ScanError};

/// Default number of worker threads; file I/O rarely benefits from more.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of worker threads shared by both phases (minimum 1).
    pub io_threads: usize,
    /// Walker filters for Phase 1.
    pub grouper: GrouperConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Observer notified about pipeline events.
    pub observer: Arc<dyn ScanObserver>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            grouper: GrouperConfig::default(),
            shutdown_flag: None,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("grouper", &self.grouper)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("observer", &"<observer>")
            .finish()
    }
}

impl FinderConfig {
    /// Set the number of worker threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the walker filters.
    #[must_use]
    pub fn with_grouper_config(mut self, grouper: GrouperConfig) -> Self {
        self.grouper = grouper;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Regular files discovered, including files that could not be inspected
    pub total_files: usize,
    /// Total size of all grouped files in bytes
    pub total_size: u64,
    /// Number of directories listed
    pub directories_scanned: usize,
    /// Files resolved as unique by length alone
    pub eliminated_by_length: usize,
    /// Files with no identical counterpart (length or content)
    pub unique_files: usize,
    /// Files that could not be inspected or read
    pub failed_files: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Worker tasks executed across both phases
    pub tasks_executed: usize,
    /// Byte comparison steps executed in Phase 2
    pub comparison_steps: usize,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether shutdown was requested while the scan was finishing
    pub interrupted: bool,
    /// Recoverable errors encountered during the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    /// Check if any recoverable error occurred.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.scan_errors.is_empty()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root directory may not be listed.
    #[error("Directory not readable: {0}")]
    UnreadableDirectory(PathBuf),

    /// Listing the root directory failed.
    #[error("Cannot list directory {path}: {source}")]
    UnlistableDirectory {
        /// Directory that failed to list
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A worker task failed unexpectedly.
    #[error("Worker task failed: {0}")]
    TaskFailed(String),
}

impl FinderError {
    /// Check if the error was caused by an unusable root path.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_)
                | Self::NotADirectory(_)
                | Self::UnreadableDirectory(_)
                | Self::UnlistableDirectory { .. }
        )
    }
}

/// Duplicate finder that orchestrates the two-phase detection pipeline.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a finder with default settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find every set of byte-identical files beneath `path`.
    ///
    /// # Returns
    ///
    /// A tuple of:
    /// - `Vec<DuplicateGroup>` - groups sorted by length (largest first),
    ///   paths sorted within each group
    /// - `ScanSummary` - statistics about the scan
    ///
    /// # Errors
    ///
    /// Returns an error if the root is unusable (see
    /// [`FinderError::is_invalid_argument`]), the worker pool cannot be
    /// created, a worker task fails, or shutdown is requested.
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut coordinator = TaskCoordinator::new(self.config.io_threads)?;
        if let Some(flag) = &self.config.shutdown_flag {
            coordinator = coordinator.with_shutdown_flag(Arc::clone(flag));
        }
        let observer = &self.config.observer;

        // Phase 1: group by length
        let scan = LengthGrouper::new(&coordinator)
            .with_observer(Arc::clone(observer))
            .with_config(self.config.grouper.clone())
            .scan(path)?;

        let uniques = scan.store.remove_uniques();
        for handle in &uniques {
            handle.close();
        }
        for handle in &uniques {
            observer.unique_file(handle.path());
        }
        log::info!(
            "Phase 1 complete: {} of {} files have a unique length",
            uniques.len(),
            scan.files
        );

        let length_groups: Vec<LengthGroup> = scan
            .store
            .drain()
            .into_iter()
            .map(|(length, members)| LengthGroup::new(length, members))
            .collect();

        // Phase 2: byte-by-byte comparison
        let report = ContentComparator::new(&coordinator)
            .with_observer(Arc::clone(observer))
            .compare_detailed(length_groups)?;

        let mut groups = report.groups;
        for group in &mut groups {
            group.sort();
        }
        groups.sort_by(|a, b| {
            b.length
                .cmp(&a.length)
                .then_with(|| a.files.first().cmp(&b.files.first()))
        });

        let mut scan_errors = scan.errors;
        scan_errors.extend(report.errors);

        let summary = ScanSummary {
            total_files: scan.files + scan.failed_files,
            total_size: scan.total_size,
            directories_scanned: scan.directories,
            eliminated_by_length: uniques.len(),
            unique_files: uniques.len() + report.unique_files,
            failed_files: scan.failed_files + report.failed_files,
            duplicate_groups: groups.len(),
            duplicate_files: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
            reclaimable_space: groups.iter().map(DuplicateGroup::wasted_space).sum(),
            tasks_executed: scan.tasks.completed + report.tasks.completed,
            comparison_steps: report.steps,
            scan_duration: start_time.elapsed(),
            interrupted: self.config.is_shutdown_requested(),
            scan_errors,
        };

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }
}
