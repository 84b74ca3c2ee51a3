//! Scan observers and progress reporting using indicatif.
//!
//! The detection pipeline reports what it discovers through the
//! [`ScanObserver`] trait. Every method has a no-op default, so an observer
//! only overrides the events it cares about. [`NoopObserver`] is used when
//! the caller supplies none.
//!
//! [`Progress`] is the terminal implementation used by the CLI: a single
//! spinner on stderr that counts directories, resolved files and groups.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives events from the duplicate detection pipeline.
///
/// Callbacks are invoked from worker threads, concurrently and in no
/// particular order.
pub trait ScanObserver: Send + Sync {
    /// A directory is about to be listed.
    fn entered_new_directory(&self, _path: &Path) {}

    /// A directory could not be listed; its subtree is skipped.
    fn unreadable_directory(&self, _path: &Path) {}

    /// A file has no byte-identical counterpart.
    fn unique_file(&self, _path: &Path) {}

    /// A file could not be read and was excluded.
    fn failed_file(&self, _path: &Path) {}

    /// A set of byte-identical files was confirmed.
    fn duplicate_group(&self, _paths: &[PathBuf]) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Spinner-based progress reporter.
pub struct Progress {
    bar: ProgressBar,
    directories: AtomicUsize,
    unreadable: AtomicUsize,
    resolved: AtomicUsize,
    failed: AtomicUsize,
    groups: AtomicUsize,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// progress.finish();
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };

        Self {
            bar,
            directories: AtomicUsize::new(0),
            unreadable: AtomicUsize::new(0),
            resolved: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            groups: AtomicUsize::new(0),
        }
    }

    /// Remove the spinner from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn refresh(&self) {
        self.bar.set_message(format!(
            "{} directories, {} files resolved, {} duplicate groups",
            self.directories.load(Ordering::Relaxed),
            self.resolved.load(Ordering::Relaxed),
            self.groups.load(Ordering::Relaxed),
        ));
    }

    /// Number of unreadable directories and failed files seen so far.
    #[must_use]
    pub fn problem_count(&self) -> usize {
        self.unreadable.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }
}

impl ScanObserver for Progress {
    fn entered_new_directory(&self, path: &Path) {
        self.directories.fetch_add(1, Ordering::Relaxed);
        log::trace!("Entering {}", path.display());
        self.refresh();
    }

    fn unreadable_directory(&self, path: &Path) {
        self.unreadable.fetch_add(1, Ordering::Relaxed);
        self.bar
            .suspend(|| log::warn!("Skipping unreadable directory {}", path.display()));
    }

    fn unique_file(&self, _path: &Path) {
        self.resolved.fetch_add(1, Ordering::Relaxed);
        self.refresh();
    }

    fn failed_file(&self, path: &Path) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.resolved.fetch_add(1, Ordering::Relaxed);
        self.bar
            .suspend(|| log::warn!("Skipping unreadable file {}", path.display()));
    }

    fn duplicate_group(&self, paths: &[PathBuf]) {
        self.groups.fetch_add(1, Ordering::Relaxed);
        self.resolved.fetch_add(paths.len(), Ordering::Relaxed);
        self.refresh();
    }
}
