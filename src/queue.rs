use crate::error::QueueError;
use std::collections::HashMap;
use std::hash::Hash;

/// Identity of a queued element, independent of its priority
pub trait Keyed {
    type Key: Hash + Eq + Clone;

    fn key(&self) -> Self::Key;
}

/// Binary min-heap with removal of arbitrary elements.
///
/// A side index maps each element's key to its slot in the heap array, so
/// `remove` and `contains` do not scan. At most one element per key is queued;
/// inserting an element whose key is already present replaces the old entry.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T: Ord + Keyed> {
    items: Vec<T>,
    slots: HashMap<T::Key, usize>,
}

impl<T: Ord + Keyed> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Keyed> PriorityQueue<T> {
    pub fn new() -> Self {
        PriorityQueue {
            items: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PriorityQueue {
            items: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.slots.clear();
    }

    /// Elements in heap-array order (not sorted)
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.slots.contains_key(&item.key())
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.slots.contains_key(key)
    }

    /// O(log n)
    pub fn insert(&mut self, item: T) {
        if let Some(&slot) = self.slots.get(&item.key()) {
            self.remove_at(slot);
        }

        let slot = self.items.len();
        self.slots.insert(item.key(), slot);
        self.items.push(item);
        self.sift_up(slot);
    }

    /// Smallest element without removing it
    pub fn peek(&self) -> Result<&T, QueueError> {
        self.items.first().ok_or(QueueError::EmptyQueue)
    }

    /// Remove and return the smallest element. O(log n)
    pub fn extract_min(&mut self) -> Result<T, QueueError> {
        if self.items.is_empty() {
            return Err(QueueError::EmptyQueue);
        }
        Ok(self.remove_at(0))
    }

    /// Remove the element with the same key as `item`, if queued.
    ///
    /// Returns false and leaves the queue untouched when nothing matches.
    pub fn remove(&mut self, item: &T) -> bool {
        self.remove_key(&item.key()).is_some()
    }

    /// Remove and return the element queued under `key`
    pub fn remove_key(&mut self, key: &T::Key) -> Option<T> {
        let slot = *self.slots.get(key)?;
        Some(self.remove_at(slot))
    }

    /// True when every non-root element is >= its parent
    pub fn is_heap_ordered(&self) -> bool {
        (1..self.items.len()).all(|i| self.items[(i - 1) / 2] <= self.items[i])
            && self.slots.len() == self.items.len()
            && self
                .items
                .iter()
                .enumerate()
                .all(|(i, item)| self.slots.get(&item.key()) == Some(&i))
    }

    fn remove_at(&mut self, slot: usize) -> T {
        let removed = self.items.swap_remove(slot);
        self.slots.remove(&removed.key());

        if slot < self.items.len() {
            self.slots.insert(self.items[slot].key(), slot);
            // The former last leaf may belong above or below `slot`
            let slot = self.sift_down(slot);
            self.sift_up(slot);
        }
        removed
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.items[parent] <= self.items[slot] {
                break;
            }
            self.swap(parent, slot);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) -> usize {
        let len = self.items.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;

            if left < len && self.items[left] < self.items[smallest] {
                smallest = left;
            }
            if right < len && self.items[right] < self.items[smallest] {
                smallest = right;
            }
            if smallest == slot {
                return slot;
            }

            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.items.swap(a, b);
        self.slots.insert(self.items[a].key(), a);
        self.slots.insert(self.items[b].key(), b);
    }
}
