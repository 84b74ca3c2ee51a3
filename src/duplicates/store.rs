//! Thread-safe grouping store.
//!
//! [`GroupingStore`] maps a group key to the [`PersistentSequence`] of its
//! members. It is shared by every worker task of a phase, so each operation
//! is a single critical section under one coarse lock: concurrent adders
//! never lose an update and no reader observes a half-updated group.
//!
//! The store never holds a key mapped to an empty sequence.
//!
//! # Example
//!
//! ```
//! use bytedupe::duplicates::GroupingStore;
//!
//! let store = GroupingStore::new();
//! store.add_grouped_element(91u64, "a.txt");
//! store.add_grouped_element(91u64, "b.txt");
//! store.add_grouped_element(26u64, "d.txt");
//!
//! let singletons = store.remove_uniques();
//! assert_eq!(singletons, vec!["d.txt"]);
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.get_group(&91).map(|g| g.len()), Some(2));
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::sequence::PersistentSequence;

/// Concurrent mapping from group key to group members.
pub struct GroupingStore<K, E> {
    groups: Mutex<HashMap<K, PersistentSequence<E>>>,
}

impl<K, E> GroupingStore<K, E>
where
    K: Eq + Hash,
{
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
        }
    }

    // Every mutation is a single map call, so a panic elsewhere while the
    // lock was held cannot leave a group half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, PersistentSequence<E>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `value` to the group for `key`, creating the group if needed.
    pub fn add_grouped_element(&self, key: K, value: E) {
        let mut groups = self.lock();
        let group = groups.entry(key).or_default();
        *group = group.append(value);
    }

    /// Check if a group exists for `key`.
    #[must_use]
    pub fn contains_group(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    /// Snapshot of the group for `key`.
    ///
    /// The returned sequence shares its nodes with the stored one; later
    /// additions to the store do not affect it.
    #[must_use]
    pub fn get_group(&self, key: &K) -> Option<PersistentSequence<E>> {
        self.lock().get(key).cloned()
    }

    /// Remove and return the group for `key`.
    pub fn remove_group(&self, key: &K) -> Option<PersistentSequence<E>> {
        self.lock().remove(key)
    }

    /// Remove and return an arbitrary group.
    pub fn pop_group(&self) -> Option<(K, PersistentSequence<E>)>
    where
        K: Clone,
    {
        let mut groups = self.lock();
        let key = groups.keys().next().cloned()?;
        groups.remove(&key).map(|group| (key, group))
    }

    /// Remove every group with exactly one member and return those members.
    ///
    /// Groups with two or more members are left untouched.
    pub fn remove_uniques(&self) -> Vec<E>
    where
        E: Clone,
    {
        let mut groups = self.lock();
        let mut uniques = Vec::new();
        groups.retain(|_, group| {
            if group.len() == 1 {
                uniques.extend(group.peek().cloned());
                false
            } else {
                true
            }
        });
        uniques
    }

    /// Remove every group, returning them in arbitrary order.
    pub fn drain(&self) -> Vec<(K, PersistentSequence<E>)> {
        self.lock().drain().collect()
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the store holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total number of elements across all groups.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.lock().values().map(PersistentSequence::len).sum()
    }
}

impl<K, E> Default for GroupingStore<K, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> std::fmt::Debug for GroupingStore<K, E>
where
    K: Eq + Hash + std::fmt::Debug,
    E: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.lock().iter()).finish()
    }
}
