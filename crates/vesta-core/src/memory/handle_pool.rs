// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A fixed-capacity slot allocator with generation-checked handles.

use crate::renderer::error::ResourceError;
use std::fmt;

/// An opaque reference to a slot in a [`HandlePool`].
///
/// The `index` addresses the slot, the `generation` identifies which occupant of the
/// slot the handle was issued for. Releasing a slot bumps its generation, so a handle
/// kept past its release no longer resolves.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle {
    index: u32,
    generation: u32,
}

impl RawHandle {
    /// The distinguished handle that never identifies a live slot.
    pub const EMPTY: RawHandle = RawHandle {
        index: u32::MAX,
        generation: 0,
    };

    /// Builds a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index this handle points at.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The generation of the slot occupant this handle was issued for.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns `true` for [`RawHandle::EMPTY`].
    pub const fn is_empty(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for RawHandle {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "RawHandle(EMPTY)")
        } else {
            write!(f, "RawHandle({}v{})", self.index, self.generation)
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A dense array of `T` with an explicit LIFO free list.
///
/// * `reserve` pops the free list, or takes the next never-used index while the pool
///   has not yet grown to its capacity.
/// * `release` pushes the index back onto the free list, so the most recently released
///   index is the first one handed out again.
///
/// The pool never grows past the capacity given at construction.
#[derive(Debug)]
pub struct HandlePool<T> {
    label: &'static str,
    capacity: usize,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> HandlePool<T> {
    /// Creates an empty pool able to hold at most `capacity` live entries.
    ///
    /// `label` names the resource kind in errors and log messages.
    pub fn with_capacity(label: &'static str, capacity: usize) -> Self {
        // u32::MAX is reserved for RawHandle::EMPTY.
        let capacity = capacity.min(u32::MAX as usize);
        Self {
            label,
            capacity,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Stores `data` in a free slot and returns its handle.
    ///
    /// # Errors
    /// [`ResourceError::CapacityExceeded`] when every slot is live.
    pub fn reserve(&mut self, data: T) -> Result<RawHandle, ResourceError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot {
                    generation: 0,
                    data: None,
                });
                (self.slots.len() - 1) as u32
            }
            None => {
                return Err(ResourceError::CapacityExceeded {
                    kind: self.label,
                    capacity: self.capacity,
                })
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.data = Some(data);
        self.live += 1;
        Ok(RawHandle::new(index, slot.generation))
    }

    /// Frees the slot behind `handle` and returns its payload.
    ///
    /// Returns `None` for the empty handle, a stale handle, or a second release of the
    /// same handle. The pool is left untouched in all those cases and logs nothing.
    pub fn release(&mut self, handle: RawHandle) -> Option<T> {
        let slot = self.slot_mut(handle)?;
        let data = slot.data.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        data
    }

    /// Returns the payload behind a live handle.
    pub fn get(&self, handle: RawHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Returns the payload behind a live handle, mutably.
    pub fn get_mut(&mut self, handle: RawHandle) -> Option<&mut T> {
        self.slot_mut(handle)?.data.as_mut()
    }

    /// Returns `true` if `handle` currently identifies a live slot.
    pub fn contains(&self, handle: RawHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no handle is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Maximum number of simultaneously live handles.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The resource kind this pool stores.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Iterates over every live handle and its payload, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (RawHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.data
                .as_ref()
                .map(|data| (RawHandle::new(index as u32, slot.generation), data))
        })
    }

    /// Hands every live payload to `visitor`, then empties the pool.
    ///
    /// Returns the number of payloads that were still live. Backends call this on
    /// shutdown to free native objects the caller never destroyed.
    pub fn cleanup(&mut self, mut visitor: impl FnMut(T)) -> usize {
        let mut visited = 0;
        for slot in self.slots.iter_mut() {
            if let Some(data) = slot.data.take() {
                visitor(data);
                visited += 1;
            }
        }
        self.slots.clear();
        self.free.clear();
        self.live = 0;
        visited
    }

    fn slot_mut(&mut self, handle: RawHandle) -> Option<&mut Slot<T>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.data.is_none() {
            return None;
        }
        Some(slot)
    }
}
