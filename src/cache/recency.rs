//! Recency List Module
//!
//! Records ordered from most to least recently used, with O(1) key lookup.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::Record;

/// Null link in the slot arena.
const NIL: usize = usize::MAX;

// == Position ==
/// Handle to a record's slot in a [`RecencyList`].
///
/// A position stays valid until its record is evicted or the list is cleared.
/// Stale positions are tolerated: lookups return `None` and moves are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(usize);

#[derive(Debug)]
struct Slot<V> {
    record: Option<Record<V>>,
    prev: usize,
    next: usize,
}

// == Recency List ==
/// Recency-ordered record store.
///
/// Records live in a slot arena linked as a doubly linked list where:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// A key index maps each key to its slot. Freed slots are recycled.
#[derive(Debug)]
pub struct RecencyList<V> {
    /// Key to slot index
    index: HashMap<String, usize>,
    /// Slot arena
    slots: Vec<Slot<V>>,
    head: usize,
    tail: usize,
    /// Head of the free-slot chain (linked through `next`)
    free: usize,
}

impl<V> Default for RecencyList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecencyList<V> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }

    // == Store ==
    /// Inserts a record or replaces the value of an existing one.
    ///
    /// New keys are linked at the front. Existing records keep their place;
    /// only their value and expiry change.
    pub fn store(&mut self, key: &str, value: V, expires_at: Option<Instant>) -> Position {
        if let Some(&idx) = self.index.get(key) {
            if let Some(record) = self.slots[idx].record.as_mut() {
                record.value = value;
                record.expires_at = expires_at;
                return Position(idx);
            }
        }

        let idx = self.alloc(Record::new(key.to_string(), value, expires_at));
        self.push_front(idx);
        self.index.insert(key.to_string(), idx);
        Position(idx)
    }

    // == Update ==
    /// Replaces value and expiry of an existing record without reordering.
    ///
    /// Returns None if the key is absent.
    pub fn update(&mut self, key: &str, value: V, expires_at: Option<Instant>) -> Option<Position> {
        let idx = *self.index.get(key)?;
        let record = self.slots[idx].record.as_mut()?;
        record.value = value;
        record.expires_at = expires_at;
        Some(Position(idx))
    }

    // == Load ==
    /// Looks up the position of a key. Does not alter order.
    pub fn load(&self, key: &str) -> Option<Position> {
        self.index.get(key).map(|&idx| Position(idx))
    }

    // == Get ==
    /// Returns the record held at a position.
    pub fn get(&self, pos: Position) -> Option<&Record<V>> {
        self.slots.get(pos.0).and_then(|slot| slot.record.as_ref())
    }

    // == Move To Front ==
    /// Marks the record at `pos` as most recently used.
    pub fn move_to_front(&mut self, pos: Position) {
        if self.get(pos).is_none() || self.head == pos.0 {
            return;
        }
        self.unlink(pos.0);
        self.push_front(pos.0);
    }

    // == Back ==
    /// Returns the least recently used position, or None if empty.
    pub fn back(&self) -> Option<Position> {
        (self.tail != NIL).then_some(Position(self.tail))
    }

    // == Evict ==
    /// Removes the record at `pos` from both the order and the index.
    ///
    /// Returns the removed record so its key and value can be observed.
    pub fn evict(&mut self, pos: Position) -> Option<Record<V>> {
        let record = self.slots.get_mut(pos.0)?.record.take()?;
        self.index.remove(&record.key);
        self.unlink(pos.0);
        self.slots[pos.0].next = self.free;
        self.free = pos.0;
        Some(record)
    }

    // == Length ==
    /// Returns the number of records held.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Clear ==
    /// Drops every record.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
        self.free = NIL;
    }

    // == Keys ==
    /// Returns a snapshot of all keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while cursor != NIL {
            let slot = &self.slots[cursor];
            if let Some(record) = &slot.record {
                keys.push(record.key.clone());
            }
            cursor = slot.next;
        }
        keys
    }

    // == Internal linked-list operations ==

    fn alloc(&mut self, record: Record<V>) -> usize {
        let slot = Slot {
            record: Some(record),
            prev: NIL,
            next: NIL,
        };
        if self.free != NIL {
            let idx = self.free;
            self.free = self.slots[idx].next;
            self.slots[idx] = slot;
            idx
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    /// Detaches a slot from the list without freeing it.
    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;

        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;

        if self.tail == NIL {
            self.tail = idx;
        }
    }
}
