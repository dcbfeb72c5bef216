//! Specialized collection types

pub use slotmap::{Key, SecondaryMap, SlotMap};

#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    sequence: u64,
}

/// Dense set of slot map keys
///
/// Keys are packed into a vector for cache-friendly iteration while a
/// secondary map tracks each key's position, so insert, remove and
/// membership checks are all O(1). Removal swaps the last key into the
/// freed position, so the dense order is not insertion order. Every insert
/// is stamped with a sequence number instead; sort by
/// [`Registry::sequence`] when insertion order matters.
#[derive(Debug, Clone)]
pub struct Registry<K: Key> {
    dense: Vec<K>,
    slots: SecondaryMap<K, Slot>,
    next_sequence: u64,
}

impl<K: Key> Registry<K> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            slots: SecondaryMap::new(),
            next_sequence: 0,
        }
    }

    /// Insert a key, returning `false` if it was already present
    pub fn insert(&mut self, key: K) -> bool {
        if self.slots.contains_key(key) {
            return false;
        }
        self.slots.insert(
            key,
            Slot {
                index: self.dense.len(),
                sequence: self.next_sequence,
            },
        );
        self.next_sequence += 1;
        self.dense.push(key);
        true
    }

    /// Remove a key, returning `false` if it was not present
    pub fn remove(&mut self, key: K) -> bool {
        let Some(slot) = self.slots.remove(key) else {
            return false;
        };
        self.dense.swap_remove(slot.index);
        if let Some(&moved) = self.dense.get(slot.index) {
            if let Some(moved) = self.slots.get_mut(moved) {
                moved.index = slot.index;
            }
        }
        true
    }

    /// Check whether a key is present
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    /// Insertion stamp of a present key
    ///
    /// Stamps only grow; a key removed and inserted again gets a new one.
    pub fn sequence(&self, key: K) -> Option<u64> {
        self.slots.get(key).map(|slot| slot.sequence)
    }

    /// Stamp the next inserted key will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the registry holds no keys
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Keys in registry order
    pub fn as_slice(&self) -> &[K] {
        &self.dense
    }

    /// Iterate over keys in registry order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.dense.iter().copied()
    }

    /// Copy the current keys into `out`, replacing its contents
    ///
    /// Used to take a pass snapshot without allocating once `out` has grown.
    pub fn snapshot_into(&self, out: &mut Vec<K>) {
        out.clear();
        out.extend_from_slice(&self.dense);
    }
}

impl<K: Key> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}
