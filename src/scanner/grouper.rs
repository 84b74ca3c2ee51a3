//! Concurrent directory walker that groups files by length.
//!
//! # Overview
//!
//! [`LengthGrouper`] is Phase 1 of duplicate detection. Every directory is
//! listed by its own task on the [`TaskCoordinator`] pool; subdirectories
//! found in a listing are submitted as new tasks and regular files are added
//! to a [`GroupingStore`] keyed by their length. No file content is read.
//!
//! The root directory is validated and listed before any task starts, so an
//! invalid root fails immediately without a partial result. A subdirectory
//! that cannot be listed is reported through
//! [`ScanObserver::unreadable_directory`] and its subtree is skipped.
//!
//! Listings are all-or-nothing: when enumeration of a directory fails
//! partway, none of its entries are used. Symbolic links are never followed.

use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use super::handle::FileHandle;
use super::ScanError;
use crate::duplicates::coordinator::{Spawner, TaskCoordinator, TaskStats};
use crate::duplicates::finder::FinderError;
use crate::duplicates::store::GroupingStore;
use crate::progress::{NoopObserver, ScanObserver};

/// Configuration for directory walking.
///
/// Both filters are off by default, so every regular file is considered.
#[derive(Debug, Clone, Default)]
pub struct GrouperConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style), matched relative to the root.
    pub ignore_patterns: Vec<String>,
}

impl GrouperConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            skip_hidden,
            ignore_patterns,
        }
    }
}

/// Result of a length-grouping scan.
#[derive(Debug)]
pub struct LengthScan {
    /// Regular files grouped by length, singletons included.
    pub store: GroupingStore<u64, Arc<FileHandle>>,
    /// Absolute path of the scanned root.
    pub root: PathBuf,
    /// Number of directories listed, root included.
    pub directories: usize,
    /// Number of regular files added to the store.
    pub files: usize,
    /// Sum of the lengths of all files added to the store.
    pub total_size: u64,
    /// Number of files whose metadata could not be read.
    pub failed_files: usize,
    /// Recoverable errors encountered during the walk.
    pub errors: Vec<ScanError>,
    /// Task counters for the walk.
    pub tasks: TaskStats,
}

/// Entry filter built from [`GrouperConfig`].
struct EntryFilter {
    root: PathBuf,
    skip_hidden: bool,
    gitignore: Option<Gitignore>,
}

impl EntryFilter {
    fn new(root: &Path, config: &GrouperConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            skip_hidden: config.skip_hidden,
            gitignore: build_gitignore(root, &config.ignore_patterns),
        }
    }

    fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        if self.skip_hidden
            && path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'))
        {
            return true;
        }

        match &self.gitignore {
            Some(gi) => {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                gi.matched(relative, is_dir).is_ignore()
            }
            None => false,
        }
    }
}

/// Build a gitignore matcher from the configured patterns.
fn build_gitignore(root: &Path, patterns: &[String]) -> Option<Gitignore> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        if let Err(e) = builder.add_line(None, pattern) {
            log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
        }
    }

    match builder.build() {
        Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Failed to build ignore patterns: {}", e);
            None
        }
    }
}

/// List the immediate entries of `path`, failing if any entry cannot be read.
fn list_directory(path: &Path) -> io::Result<Vec<DirEntry>> {
    fs::read_dir(path)?.collect()
}

/// Shared state of one walk, borrowed by every directory task.
struct Walk<'a> {
    observer: &'a dyn ScanObserver,
    filter: EntryFilter,
    store: GroupingStore<u64, Arc<FileHandle>>,
    directories: AtomicUsize,
    files: AtomicUsize,
    failed_files: AtomicUsize,
    total_size: AtomicU64,
    errors: Mutex<Vec<ScanError>>,
}

impl<'a> Walk<'a> {
    fn record_error(&self, error: ScanError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    fn enter(&self, dir: &Path) {
        self.directories.fetch_add(1, Ordering::Relaxed);
        self.observer.entered_new_directory(dir);
    }

    fn walk_directory<'s>(&'s self, dir: PathBuf, spawner: &Spawner<'_, 's>) {
        match list_directory(&dir) {
            Ok(entries) => {
                self.enter(&dir);
                self.process_entries(entries, spawner);
            }
            Err(source) => {
                log::warn!("Cannot list directory {}: {}", dir.display(), source);
                self.observer.unreadable_directory(&dir);
                self.record_error(ScanError::UnreadableDirectory { path: dir, source });
            }
        }
    }

    fn process_entries<'s>(&'s self, entries: Vec<DirEntry>, spawner: &Spawner<'_, 's>) {
        for entry in entries {
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(source) => {
                    self.fail_file(path, source);
                    continue;
                }
            };

            if self.filter.is_excluded(&path, file_type.is_dir()) {
                log::trace!("Ignoring {}", path.display());
                continue;
            }

            if file_type.is_dir() {
                spawner.submit(move |s| {
                    self.walk_directory(path, s);
                    Ok(())
                });
            } else if file_type.is_file() {
                match entry.metadata() {
                    Ok(metadata) => self.add_file(path, metadata.len()),
                    Err(source) => self.fail_file(path, source),
                }
            } else {
                log::trace!("Skipping non-regular entry {}", path.display());
            }
        }
    }

    fn add_file(&self, path: PathBuf, length: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.total_size.fetch_add(length, Ordering::Relaxed);
        self.store
            .add_grouped_element(length, Arc::new(FileHandle::new(path, length)));
    }

    fn fail_file(&self, path: PathBuf, source: io::Error) {
        log::warn!("Cannot inspect {}: {}", path.display(), source);
        self.failed_files.fetch_add(1, Ordering::Relaxed);
        self.observer.failed_file(&path);
        self.record_error(ScanError::FileRead { path, source });
    }
}

/// Phase 1 walker: groups every regular file under a root by its length.
pub struct LengthGrouper<'c> {
    coordinator: &'c TaskCoordinator,
    observer: Arc<dyn ScanObserver>,
    config: GrouperConfig,
}

impl<'c> LengthGrouper<'c> {
    /// Create a grouper that runs its directory tasks on `coordinator`.
    #[must_use]
    pub fn new(coordinator: &'c TaskCoordinator) -> Self {
        Self {
            coordinator,
            observer: Arc::new(NoopObserver),
            config: GrouperConfig::default(),
        }
    }

    /// Set the observer notified about directories and failed files.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the walk filters.
    #[must_use]
    pub fn with_config(mut self, config: GrouperConfig) -> Self {
        self.config = config;
        self
    }

    /// Walk `root` and group every regular file beneath it by length.
    ///
    /// # Errors
    ///
    /// Fails without a partial result if the root does not exist, is not a
    /// directory, or cannot be listed. Also propagates task failures and
    /// interruption from the coordinator.
    pub fn scan(&self, root: &Path) -> Result<LengthScan, FinderError> {
        if root.as_os_str().is_empty() || !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        let root = std::path::absolute(root).map_err(|source| FinderError::UnlistableDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        let entries = list_directory(&root).map_err(|source| {
            if source.kind() == io::ErrorKind::PermissionDenied {
                FinderError::UnreadableDirectory(root.clone())
            } else {
                FinderError::UnlistableDirectory {
                    path: root.clone(),
                    source,
                }
            }
        })?;

        log::info!("Phase 1: Grouping files under {} by length", root.display());

        let walk = Walk {
            observer: self.observer.as_ref(),
            filter: EntryFilter::new(&root, &self.config),
            store: GroupingStore::new(),
            directories: AtomicUsize::new(0),
            files: AtomicUsize::new(0),
            failed_files: AtomicUsize::new(0),
            total_size: AtomicU64::new(0),
            errors: Mutex::new(Vec::new()),
        };

        let tasks = self.coordinator.run(|spawner| {
            walk.enter(&root);
            walk.process_entries(entries, spawner);
            Ok(())
        })?;

        let Walk {
            store,
            directories,
            files,
            failed_files,
            total_size,
            errors,
            ..
        } = walk;

        let scan = LengthScan {
            store,
            root,
            directories: directories.into_inner(),
            files: files.into_inner(),
            total_size: total_size.into_inner(),
            failed_files: failed_files.into_inner(),
            errors: errors.into_inner().unwrap_or_else(PoisonError::into_inner),
            tasks,
        };

        log::debug!(
            "Walked {} directories: {} files in {} length groups",
            scan.directories,
            scan.files,
            scan.store.len()
        );

        Ok(scan)
    }
}

impl std::fmt::Debug for LengthGrouper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LengthGrouper")
            .field("coordinator", &self.coordinator)
            .field("observer", &"<observer>")
            .field("config", &self.config)
            .finish()
    }
}
