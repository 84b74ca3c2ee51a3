//! Progressive byte-by-byte content comparison (Phase 2).
//!
//! # Overview
//!
//! [`ContentComparator`] takes groups of equal-length files and refines them
//! one byte at a time. Each step reads the next byte of every member,
//! partitions the members by what was read, and then:
//!
//! - closes and reports members whose read failed,
//! - closes and reports members that ended up alone in their partition,
//! - emits the end-of-stream partition (if it has two or more members) as a
//!   confirmed [`DuplicateGroup`],
//! - submits every other partition with two or more members as a new step
//!   one byte deeper.
//!
//! A file handle is closed the moment its file is resolved, so at any time
//! only files that are still candidates hold an open descriptor.
//!
//! # Abort handling
//!
//! Members are owned by a `CandidateGroup` until they are resolved or moved
//! into the next step's partition. If a step panics, returns an error, or is
//! dropped because the run was aborted, the guards close every handle they
//! still own.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::coordinator::{Spawner, TaskCoordinator, TaskStats};
use super::finder::FinderError;
use super::groups::{DuplicateGroup, LengthGroup};
use super::sequence::PersistentSequence;
use super::store::GroupingStore;
use crate::progress::{NoopObserver, ScanObserver};
use crate::scanner::{ByteRead, FileHandle, ScanError};

/// Partition key for one comparison step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKey {
    /// The member's next byte.
    Byte(u8),
    /// The member has no bytes left.
    EndOfStream,
}

/// Members that matched on every byte before `offset`.
struct CandidateGroup {
    length: u64,
    offset: u64,
    members: PersistentSequence<Arc<FileHandle>>,
    armed: bool,
}

impl CandidateGroup {
    fn new(length: u64, offset: u64, members: PersistentSequence<Arc<FileHandle>>) -> Self {
        Self {
            length,
            offset,
            members,
            armed: true,
        }
    }

    /// Close every member and hand back their paths.
    fn close_all(mut self) -> Vec<PathBuf> {
        self.armed = false;
        self.members
            .iter()
            .map(|handle| {
                handle.close();
                handle.path().to_path_buf()
            })
            .collect()
    }

    /// Stop closing members on drop; ownership has moved elsewhere.
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CandidateGroup {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let closed = self.members.iter().filter(|handle| handle.close()).count();
        if closed > 0 {
            log::debug!(
                "Closed {} abandoned handles at offset {}",
                closed,
                self.offset
            );
        }
    }
}

/// Members of one step, keyed by what was read.
///
/// Whatever is still in the partition when it is dropped gets closed.
struct Partition {
    store: GroupingStore<ReadKey, Arc<FileHandle>>,
}

impl Partition {
    fn new() -> Self {
        Self {
            store: GroupingStore::new(),
        }
    }
}

impl Drop for Partition {
    fn drop(&mut self) {
        for (_, members) in self.store.drain() {
            for handle in &members {
                handle.close();
            }
        }
    }
}

/// Outcome of a comparison run with its counters.
#[derive(Debug, Default)]
pub struct ComparisonReport {
    /// Confirmed duplicate groups.
    pub groups: Vec<DuplicateGroup>,
    /// Files that turned out to have no identical counterpart.
    pub unique_files: usize,
    /// Files that could not be read.
    pub failed_files: usize,
    /// Per-file read failures.
    pub errors: Vec<ScanError>,
    /// Number of comparison steps executed.
    pub steps: usize,
    /// Task counters for the run.
    pub tasks: TaskStats,
}

/// Shared state of one comparison run.
struct Comparison<'a> {
    observer: &'a dyn ScanObserver,
    duplicates: Mutex<Vec<DuplicateGroup>>,
    errors: Mutex<Vec<ScanError>>,
    unique_files: AtomicUsize,
    failed_files: AtomicUsize,
    steps: AtomicUsize,
}

impl<'a> Comparison<'a> {
    fn new(observer: &'a dyn ScanObserver) -> Self {
        Self {
            observer,
            duplicates: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            unique_files: AtomicUsize::new(0),
            failed_files: AtomicUsize::new(0),
            steps: AtomicUsize::new(0),
        }
    }

    /// Advance `group` by one byte and dispatch the resulting partitions.
    fn refine<'s>(
        &'s self,
        mut group: CandidateGroup,
        spawner: &Spawner<'_, 's>,
    ) -> Result<(), FinderError> {
        self.steps.fetch_add(1, Ordering::Relaxed);

        let partition = Partition::new();
        let mut failed = Vec::new();

        for handle in &group.members {
            match handle.read_byte() {
                ByteRead::Byte(byte) => partition
                    .store
                    .add_grouped_element(ReadKey::Byte(byte), Arc::clone(handle)),
                ByteRead::EndOfStream => partition
                    .store
                    .add_grouped_element(ReadKey::EndOfStream, Arc::clone(handle)),
                ByteRead::Failed(source) => {
                    handle.close();
                    failed.push((handle.path().to_path_buf(), source));
                }
            }
        }
        // Every member is now either closed or owned by the partition.
        group.disarm();

        let (length, next_offset) = (group.length, group.offset + 1);
        let mut resolved = Vec::new();
        let mut uniques = Vec::new();

        while let Some((key, members)) = partition.store.pop_group() {
            let candidate = CandidateGroup::new(length, next_offset, members);

            if candidate.members.len() == 1 {
                uniques.extend(candidate.close_all());
            } else if key == ReadKey::EndOfStream {
                if group.offset != length {
                    log::debug!(
                        "Files changed since scan: expected {} bytes, found {}",
                        length,
                        group.offset
                    );
                }
                let mut paths = candidate.close_all();
                paths.sort();
                resolved.push(DuplicateGroup::new(group.offset, paths));
            } else {
                spawner.submit(move |s| self.refine(candidate, s));
            }
        }

        // All handles of this step are closed or handed off; only now is
        // anything reported.
        self.report_failed(failed);
        self.report_uniques(&uniques);
        self.report_duplicates(resolved);

        Ok(())
    }

    fn report_failed(&self, failed: Vec<(PathBuf, std::io::Error)>) {
        if failed.is_empty() {
            return;
        }
        self.failed_files.fetch_add(failed.len(), Ordering::Relaxed);

        for (path, source) in failed {
            log::warn!("Cannot read {}: {}", path.display(), source);
            self.observer.failed_file(&path);
            self.errors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ScanError::FileRead { path, source });
        }
    }

    fn report_uniques(&self, uniques: &[PathBuf]) {
        self.unique_files.fetch_add(uniques.len(), Ordering::Relaxed);
        for path in uniques {
            log::trace!("Unique: {}", path.display());
            self.observer.unique_file(path);
        }
    }

    fn report_duplicates(&self, resolved: Vec<DuplicateGroup>) {
        for group in resolved {
            log::debug!(
                "Duplicate group of {} files, {} bytes each",
                group.len(),
                group.length
            );
            self.observer.duplicate_group(&group.files);
            self.duplicates
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(group);
        }
    }
}

/// Phase 2 comparator: splits equal-length groups into identical sets.
///
/// # Example
///
/// ```no_run
/// use bytedupe::duplicates::{ContentComparator, LengthGroup, TaskCoordinator};
/// use std::path::PathBuf;
///
/// let coordinator = TaskCoordinator::new(4).unwrap();
/// let group = LengthGroup::from_paths(
///     91,
///     vec![PathBuf::from("/data/a.txt"), PathBuf::from("/data/b.txt")],
/// );
///
/// let duplicates = ContentComparator::new(&coordinator)
///     .compare(vec![group])
///     .unwrap();
/// println!("{} duplicate groups", duplicates.len());
/// ```
pub struct ContentComparator<'c> {
    coordinator: &'c TaskCoordinator,
    observer: Arc<dyn ScanObserver>,
}

impl<'c> ContentComparator<'c> {
    /// Create a comparator that runs its steps on `coordinator`.
    #[must_use]
    pub fn new(coordinator: &'c TaskCoordinator) -> Self {
        Self {
            coordinator,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Set the observer notified about resolved files and groups.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Compare `groups` and return every set of identical files.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::TaskFailed`] if a comparison step fails
    /// unexpectedly and [`FinderError::Interrupted`] on shutdown. Unreadable
    /// files are not errors; they are reported and excluded.
    pub fn compare(&self, groups: Vec<LengthGroup>) -> Result<Vec<DuplicateGroup>, FinderError> {
        self.compare_detailed(groups).map(|report| report.groups)
    }

    /// Like [`compare`](Self::compare), but also return the run's counters.
    ///
    /// # Errors
    ///
    /// Same as [`compare`](Self::compare). Every handle in `groups` is closed
    /// whether the run succeeds or not.
    pub fn compare_detailed(
        &self,
        groups: Vec<LengthGroup>,
    ) -> Result<ComparisonReport, FinderError> {
        let candidates: Vec<CandidateGroup> = groups
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(|group| CandidateGroup::new(group.length, 0, group.members))
            .collect();

        if candidates.is_empty() {
            return Ok(ComparisonReport::default());
        }

        log::info!(
            "Phase 2: Comparing {} files in {} length groups",
            candidates.iter().map(|c| c.members.len()).sum::<usize>(),
            candidates.len()
        );

        let comparison = Comparison::new(self.observer.as_ref());

        let tasks = self.coordinator.run(|spawner| {
            for candidate in candidates {
                let comparison = &comparison;
                spawner.submit(move |s| comparison.refine(candidate, s));
            }
            Ok(())
        })?;

        let Comparison {
            duplicates,
            errors,
            unique_files,
            failed_files,
            steps,
            ..
        } = comparison;

        let report = ComparisonReport {
            groups: duplicates.into_inner().unwrap_or_else(PoisonError::into_inner),
            unique_files: unique_files.into_inner(),
            failed_files: failed_files.into_inner(),
            errors: errors.into_inner().unwrap_or_else(PoisonError::into_inner),
            steps: steps.into_inner(),
            tasks,
        };

        log::debug!(
            "Compared in {} steps: {} groups, {} unique, {} failed",
            report.steps,
            report.groups.len(),
            report.unique_files,
            report.failed_files
        );

        Ok(report)
    }
}

impl std::fmt::Debug for ContentComparator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentComparator")
            .field("coordinator", &self.coordinator)
            .field("observer", &"<observer>")
            .finish()
    }
}
