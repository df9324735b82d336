//! Reservation station: bounded pool of scheduled instructions.
//!
//! Physically an unordered multiset; every phase that needs an order
//! (firing, State Update selection) sorts the tags it collects rather than
//! relying on storage position. Entries are addressed by tag and
//! re-resolved each phase; no references into the pool are held across
//! mutations.

use crate::pipeline::instruction::{InFlightInst, Tag};

/// Bounded buffer of in-flight instructions between Schedule and State Update.
pub struct ReservationStation {
    entries: Vec<InFlightInst>,
    capacity: usize,
}

impl ReservationStation {
    /// Creates an empty station with room for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the station holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if no more entries can be scheduled this cycle.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Adds an entry. The caller checks [`is_full`](Self::is_full) first;
    /// the capacity bound is a scheduling invariant, not a runtime error.
    pub fn push(&mut self, inst: InFlightInst) {
        debug_assert!(!self.is_full());
        self.entries.push(inst);
    }

    /// Looks up an entry by tag.
    pub fn get(&self, tag: Tag) -> Option<&InFlightInst> {
        self.entries.iter().find(|inst| inst.tag == tag)
    }

    /// Looks up an entry by tag, mutably.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut InFlightInst> {
        self.entries.iter_mut().find(|inst| inst.tag == tag)
    }

    /// Iterates over entries in storage order (no meaning attached).
    pub fn iter(&self) -> impl Iterator<Item = &InFlightInst> {
        self.entries.iter()
    }

    /// Iterates mutably over entries in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InFlightInst> {
        self.entries.iter_mut()
    }

    /// Removes every entry whose tag is in `tags`.
    pub fn evict(&mut self, tags: &[Tag]) {
        self.entries.retain(|inst| !tags.contains(&inst.tag));
    }
}
