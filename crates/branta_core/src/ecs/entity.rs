//! # Entity Handles and Allocation
//!
//! Entities are bare indices into the pre-allocated columns. A round-robin
//! cursor hands out free slots, starting each scan at the most recently
//! allocated slot and wrapping at capacity.

use std::fmt;

use crate::ecs::presence::{PresenceIndex, EXISTENCE_MASK};
use crate::ecs::storage::Stores;
use crate::error::CapacityError;

/// Handle for one entity slot.
///
/// Plain index, no generation counter. A destroyed slot hands the same
/// index to the next entity allocated into it; destruction clears every
/// column so the new entity starts blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a handle for the given slot index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round-robin slot allocator.
///
/// Holds only the scan cursor; liveness lives in the presence index.
pub(crate) struct EntityAllocator {
    capacity: usize,
    cursor: u32,
}

impl EntityAllocator {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
        }
    }

    /// Claims the next free slot and marks it live.
    ///
    /// The scan starts at the most recently allocated slot and wraps once
    /// around the whole range.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] when every slot is live.
    pub(crate) fn create(&mut self, presence: &mut PresenceIndex) -> Result<EntityId, CapacityError> {
        for step in 0..self.capacity {
            let slot = (self.cursor as usize + step) % self.capacity;
            let id = EntityId::new(slot as u32);
            if !presence.exists(id) {
                self.cursor = slot as u32;
                presence.include_mask(id, EXISTENCE_MASK);
                return Ok(id);
            }
        }
        Err(CapacityError {
            capacity: self.capacity,
        })
    }

    /// Releases one slot: clears its presence word and restores every
    /// column to its initial value.
    ///
    /// Releasing a dead slot is a no-op; an out-of-range handle warns.
    pub(crate) fn destroy(&self, presence: &mut PresenceIndex, stores: &mut Stores, id: EntityId) {
        if id.index() >= self.capacity {
            tracing::warn!(entity = %id, "destroy of out-of-range entity ignored");
            return;
        }
        presence.clear_word(id);
        stores.reset_entity(id);
    }
}
