//! Billboard object pool
//!
//! All records live in one `Vec` and never move. Two intrusive
//! [`IndexList`]s partition the slots into *active* billboards (in creation
//! order, or sorted order after a visibility sort) and *free* slots waiting for
//! reuse. Acquiring, releasing and clearing are list splices; nothing is
//! allocated except when the pool grows.
//!
//! Handle validity is tracked with a per-slot generation, bumped on acquire
//! and release, plus a pool-wide epoch bumped on [`BillboardPool::release_all`].
//! A slot is live for a handle when both match, so clearing stays O(1).

use super::record::{Billboard, BillboardHandle};
use crate::foundation::collections::{IndexList, Linked, Links};
use crate::foundation::math::Vec3;
use crate::render::ColourValue;

#[derive(Debug, Clone, Default)]
struct Slot {
    billboard: Billboard,
    links: Links,
    generation: u32,
    epoch: u32,
}

impl Linked for Slot {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// Arena of billboard records split into active and free lists
#[derive(Debug, Clone, Default)]
pub struct BillboardPool {
    slots: Vec<Slot>,
    active: IndexList,
    free: IndexList,
    epoch: u32,
}

impl BillboardPool {
    /// Pool with `capacity` free records
    pub fn new(capacity: usize) -> Self {
        let mut pool = Self::default();
        pool.grow_to(capacity);
        pool
    }

    /// Total number of records
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active billboards
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of free records
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Grow to `capacity` records, appending the new ones to the free list.
    /// Returns whether anything was added; the pool never shrinks.
    pub fn grow_to(&mut self, capacity: usize) -> bool {
        let current = self.slots.len();
        if capacity <= current {
            return false;
        }
        self.slots.resize_with(capacity, Slot::default);
        for index in current..capacity {
            self.free.push_back(&mut self.slots, index);
        }
        true
    }

    /// Move the front free record to the back of the active list and reset it.
    /// Returns `None` when no record is free.
    pub fn acquire(&mut self, position: Vec3, colour: ColourValue) -> Option<BillboardHandle> {
        let index = self.free.pop_front(&mut self.slots)?;
        self.active.push_back(&mut self.slots, index);

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.epoch = self.epoch;
        slot.billboard.reset(position, colour);
        Some(Self::make_handle(index, slot.generation))
    }

    /// Whether `handle` refers to a currently active billboard
    pub fn contains(&self, handle: BillboardHandle) -> bool {
        self.live_index(handle).is_some()
    }

    /// Release the billboard `handle` refers to; stale handles are ignored
    pub fn release(&mut self, handle: BillboardHandle) -> bool {
        match self.live_index(handle) {
            Some(index) => {
                self.release_index(index);
                true
            }
            None => false,
        }
    }

    /// Release the `n`th active billboard
    pub fn release_nth(&mut self, n: usize) -> bool {
        match self.active.nth(&self.slots, n) {
            Some(index) => {
                self.release_index(index);
                true
            }
            None => false,
        }
    }

    /// Release every active billboard in O(1)
    pub fn release_all(&mut self) {
        self.free.append(&mut self.slots, &mut self.active);
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Slot index of the `n`th active billboard, walking from the nearer end
    pub fn nth_index(&self, n: usize) -> Option<usize> {
        self.active.nth(&self.slots, n)
    }

    /// Handle of the `n`th active billboard
    pub fn nth_handle(&self, n: usize) -> Option<BillboardHandle> {
        self.nth_index(n)
            .map(|index| Self::make_handle(index, self.slots[index].generation))
    }

    /// Billboard a live handle refers to
    pub fn get(&self, handle: BillboardHandle) -> Option<&Billboard> {
        self.live_index(handle).map(|index| &self.slots[index].billboard)
    }

    /// Mutable billboard a live handle refers to
    pub fn get_mut(&mut self, handle: BillboardHandle) -> Option<&mut Billboard> {
        self.live_index(handle)
            .map(move |index| &mut self.slots[index].billboard)
    }

    /// Billboard in slot `index`; the slot may be free
    pub fn slot(&self, index: usize) -> &Billboard {
        &self.slots[index].billboard
    }

    /// Mutable billboard in slot `index`; the slot may be free
    pub fn slot_mut(&mut self, index: usize) -> &mut Billboard {
        &mut self.slots[index].billboard
    }

    /// Active slot indices front to back
    pub fn active_indices(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.active.iter(&self.slots)
    }

    /// Active billboards front to back
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Billboard> + '_ {
        self.active_indices().map(|index| &self.slots[index].billboard)
    }

    /// Reorder the active list to follow `order`, a permutation of the
    /// active slot indices
    pub fn reorder_active(&mut self, order: &[usize]) {
        self.active.relink(&mut self.slots, order);
    }

    fn release_index(&mut self, index: usize) {
        self.active.unlink(&mut self.slots, index);
        self.free.push_back(&mut self.slots, index);
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
    }

    fn live_index(&self, handle: BillboardHandle) -> Option<usize> {
        let index = usize::try_from(handle.index).ok()?;
        let slot = self.slots.get(index)?;
        (slot.generation == handle.generation && slot.epoch == self.epoch).then_some(index)
    }

    fn make_handle(index: usize, generation: u32) -> BillboardHandle {
        BillboardHandle {
            index: u32::try_from(index).unwrap_or(u32::MAX),
            generation,
        }
    }
}
