//! Persistent append-only sequence with structural sharing.
//!
//! # Overview
//!
//! [`PersistentSequence`] is the building block for group contents. Every
//! [`append`](PersistentSequence::append) produces a new sequence whose head
//! node points at the receiver's head, so earlier snapshots stay valid and
//! no elements are ever copied.
//!
//! Traversal runs from the most recently appended element back to the first
//! one.
//!
//! # Example
//!
//! ```
//! use bytedupe::duplicates::PersistentSequence;
//!
//! let empty = PersistentSequence::new();
//! let one = empty.append("a");
//! let three = one.append("b").append("c");
//!
//! assert!(empty.is_empty());
//! assert_eq!(one.len(), 1);
//! assert_eq!(three.peek(), Some(&"c"));
//! assert_eq!(three.iter().copied().collect::<Vec<_>>(), vec!["c", "b", "a"]);
//! ```

use std::fmt;
use std::sync::Arc;

struct Node<E> {
    value: E,
    prev: Option<Arc<Node<E>>>,
}

/// Immutable, structurally shared, append-only sequence.
///
/// Cloning is O(1) and shares every node with the original.
pub struct PersistentSequence<E> {
    head: Option<Arc<Node<E>>>,
    len: usize,
}

impl<E> PersistentSequence<E> {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Return a new sequence with `value` appended.
    ///
    /// The receiver is left unchanged and shares all of its nodes with the
    /// returned sequence.
    #[must_use]
    pub fn append(&self, value: E) -> Self {
        Self {
            head: Some(Arc::new(Node {
                value,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Number of elements in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The most recently appended element, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&E> {
        self.head.as_ref().map(|node| &node.value)
    }

    /// Return a new sequence without the most recently appended element.
    ///
    /// Removing from an empty sequence yields another empty sequence.
    #[must_use]
    pub fn remove_last(&self) -> Self {
        match &self.head {
            Some(node) => Self {
                head: node.prev.clone(),
                len: self.len - 1,
            },
            None => Self::new(),
        }
    }

    /// Traverse from the most recently appended element to the first one.
    ///
    /// Each call starts a fresh traversal.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            next: self.head.as_deref(),
            remaining: self.len,
        }
    }
}

impl<E> Default for PersistentSequence<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for PersistentSequence<E> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for PersistentSequence<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<E> Drop for PersistentSequence<E> {
    // Unlink uniquely owned nodes one at a time so that dropping a long
    // chain does not recurse once per node.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut node) => next = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

impl<E> FromIterator<E> for PersistentSequence<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |sequence, value| sequence.append(value))
    }
}

impl<'a, E> IntoIterator for &'a PersistentSequence<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`PersistentSequence`], most recent element first.
pub struct Iter<'a, E> {
    next: Option<&'a Node<E>>,
    remaining: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.prev.as_deref();
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for Iter<'_, E> {}
