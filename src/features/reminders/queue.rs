//! # Lazy-Deletion Priority Queue
//!
//! Binary min-heap with O(1) logical removal by identity. Removed entries
//! stay in the heap as tombstones until `pop` reaches them, so cancelling a
//! reminder never forces a rebuild.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Re-pushing a live identity replaces the old entry
//! - 1.0.0: Initial release with tombstone removal and snapshots
//!
//! Equal items come out in whatever order the heap happens to hold them.
//! Callers that need a stable order must encode it in `Ord`.

use std::cmp::Ordering;
use std::collections::binary_heap;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// Items that carry an identity separate from their ordering key
pub trait Identified {
    type Id: Copy + Eq + Hash + Debug;

    fn identity(&self) -> Self::Id;
}

/// Physical heap slot. `seq` distinguishes two entries with the same identity.
#[derive(Debug, Clone)]
struct Entry<T> {
    seq: u64,
    item: T,
}

// Reversed so the std max-heap behaves as a min-heap.
impl<T: Ord> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl<T: Ord> Eq for Entry<T> {}

impl<T: Ord> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.item.cmp(&self.item)
    }
}

/// Min-priority queue with tombstone deletion
#[derive(Debug, Clone)]
pub struct PriorityQueue<T: Ord + Identified> {
    heap: BinaryHeap<Entry<T>>,
    /// Identity -> seq of its live entry
    live: HashMap<T::Id, u64>,
    /// Seqs of tombstoned entries still physically in the heap
    deleted: HashSet<u64>,
    next_seq: u64,
}

impl<T: Ord + Identified> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Identified> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            deleted: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Rebuild a queue from items in any order
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut queue = Self::new();
        let mut entries = Vec::new();

        for item in items {
            let seq = queue.allocate_seq();
            if let Some(stale) = queue.live.insert(item.identity(), seq) {
                queue.deleted.insert(stale);
            }
            entries.push(Entry { seq, item });
        }

        // O(n) heapify instead of n pushes
        queue.heap = BinaryHeap::from(entries);
        queue
    }

    /// Insert an item in O(log n).
    ///
    /// If an entry with the same identity is live it is tombstoned, so the
    /// queue never holds two live copies of one identity.
    pub fn push(&mut self, item: T) {
        let seq = self.allocate_seq();
        if let Some(stale) = self.live.insert(item.identity(), seq) {
            self.deleted.insert(stale);
        }
        self.heap.push(Entry { seq, item });
    }

    /// Smallest live item, without removing it.
    ///
    /// Falls back to a linear scan when the heap top is a tombstone; the
    /// heap itself is left untouched.
    pub fn peek(&self) -> Option<&T> {
        let top = self.heap.peek()?;
        if !self.deleted.contains(&top.seq) {
            return Some(&top.item);
        }

        self.iter().min()
    }

    /// Remove and return the smallest live item, discarding tombstones on
    /// the way.
    pub fn pop(&mut self) -> Option<T> {
        while let Some(entry) = self.heap.pop() {
            if self.deleted.remove(&entry.seq) {
                continue;
            }
            self.live.remove(&entry.item.identity());
            return Some(entry.item);
        }
        None
    }

    /// Tombstone the live entry with this identity.
    ///
    /// Returns `false` when nothing was live under that identity; that case
    /// is not an error.
    pub fn remove(&mut self, id: &T::Id) -> bool {
        match self.live.remove(id) {
            Some(seq) => {
                self.deleted.insert(seq);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.live.contains_key(id)
    }

    /// Logical size: physical entries minus tombstones
    pub fn len(&self) -> usize {
        self.heap.len() - self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tombstones waiting to be popped
    pub fn tombstones(&self) -> usize {
        self.deleted.len()
    }

    /// Live items in heap-array order (not sorted)
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.heap.iter(),
            deleted: &self.deleted,
        }
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
        self.deleted.clear();
    }

    fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl<T: Ord + Identified + Clone> PriorityQueue<T> {
    /// Live items in heap-array order, for persistence.
    /// Tombstones are never written out.
    pub fn snapshot(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T: Ord + Identified> FromIterator<T> for PriorityQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

/// Iterator over live items, skipping tombstones
pub struct Iter<'a, T> {
    inner: binary_heap::Iter<'a, Entry<T>>,
    deleted: &'a HashSet<u64>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let deleted = self.deleted;
        self.inner
            .find(|entry| !deleted.contains(&entry.seq))
            .map(|entry| &entry.item)
    }
}

impl<'a, T: Ord + Identified> IntoIterator for &'a PriorityQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
