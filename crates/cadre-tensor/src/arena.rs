//! Flush-scoped storage for input tensors.
//!
//! [`TensorArena`] keeps one named slot per input tensor. A slot is
//! checked out with [`acquire`](TensorArena::acquire) during generation
//! and released in bulk by [`reset`](TensorArena::reset) at the flush
//! boundary. Released slots keep their backing `Vec<f32>`, so a runner
//! whose batch size has stabilised stops allocating entirely.

use indexmap::IndexMap;

use crate::tensor::{Tensor, TensorShape};

struct Slot {
    tensor: Tensor,
    live: bool,
}

/// Named tensor slots reused across flushes.
///
/// Owned by the model runner and passed by reference to the generator
/// and the executor; there is no process-wide allocator.
///
/// Slot order is first-acquisition order, so iteration over live tensors
/// is deterministic across flushes.
pub struct TensorArena {
    slots: IndexMap<String, Slot>,
    /// Number of times a slot had to grow its backing allocation.
    grow_events: u64,
}

impl TensorArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
            grow_events: 0,
        }
    }

    /// Create an arena with pre-reserved slots.
    ///
    /// Each named slot reserves `capacity` elements up front; none is
    /// live until acquired.
    pub fn with_capacity(names: &[&str], capacity: usize) -> Self {
        let mut arena = Self::new();
        for &name in names {
            arena.slots.insert(
                name.to_string(),
                Slot {
                    tensor: Tensor::reserved(name, capacity),
                    live: false,
                },
            );
        }
        arena
    }

    /// Check out the slot `name` with `shape`, zero-filled.
    ///
    /// Reuses the slot's backing storage when one exists. Acquiring a
    /// name twice before [`reset`](Self::reset) re-zeroes the slot.
    pub fn acquire(&mut self, name: &str, shape: TensorShape) -> &mut Tensor {
        let needed = shape.element_count();
        if !self.slots.contains_key(name) {
            self.grow_events += 1;
            self.slots.insert(
                name.to_string(),
                Slot {
                    tensor: Tensor::zeros(name, shape),
                    live: true,
                },
            );
            return &mut self.slots[name].tensor;
        }
        let slot = &mut self.slots[name];
        if slot.tensor.capacity() < needed {
            self.grow_events += 1;
        }
        slot.tensor.reshape_zeroed(shape);
        slot.live = true;
        &mut slot.tensor
    }

    /// Release every slot for the next flush.
    ///
    /// Does not free or zero the backing storage; the next
    /// [`acquire`](Self::acquire) zero-fills what it hands out.
    pub fn reset(&mut self) {
        for slot in self.slots.values_mut() {
            slot.live = false;
        }
    }

    /// A live tensor by name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.slots
            .get(name)
            .filter(|s| s.live)
            .map(|s| &s.tensor)
    }

    /// Live tensors in first-acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.slots.values().filter(|s| s.live).map(|s| &s.tensor)
    }

    /// Names of live tensors in first-acquisition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|t| t.name())
    }

    /// Number of live tensors.
    pub fn live_count(&self) -> usize {
        self.slots.values().filter(|s| s.live).count()
    }

    /// Number of slots ever created.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Times a slot was created or had to grow its allocation.
    pub fn grow_events(&self) -> u64 {
        self.grow_events
    }

    /// Memory held by every slot's backing storage, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.slots
            .values()
            .map(|s| s.tensor.capacity() * std::mem::size_of::<f32>())
            .sum()
    }
}

impl Default for TensorArena {
    fn default() -> Self {
        Self::new()
    }
}
