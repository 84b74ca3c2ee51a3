//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Length-based file grouping (Phase 1, driven from [`finder`])
//! - Progressive byte-by-byte comparison (Phase 2)
//! - The worker pool and task barrier shared by both phases
//! - The grouping store and persistent sequences holding group members
//!
//! # Architecture
//!
//! - [`sequence`]: append-only, structurally shared member lists
//! - [`store`]: thread-safe key to group mapping
//! - [`coordinator`]: worker pool that awaits dynamically submitted tasks
//! - [`comparator`]: recursive content partitioning
//! - [`groups`]: length groups and confirmed duplicate groups
//! - [`finder`]: the pipeline entry point

pub mod comparator;
pub mod coordinator;
pub mod finder;
pub mod groups;
pub mod sequence;
pub mod store;

pub use comparator::{ComparisonReport, ContentComparator, ReadKey};
pub use coordinator::{Spawner, TaskCoordinator, TaskStats};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_IO_THREADS};
pub use groups::{DuplicateGroup, LengthGroup};
pub use sequence::PersistentSequence;
pub use store::GroupingStore;
