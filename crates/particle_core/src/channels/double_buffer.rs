use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

/// Two-slot publish/acquire cell for small snapshots.
///
/// The writer fills the slot that is not currently published, then swaps
/// the `front` index with release ordering; readers load `front` with
/// acquire ordering and copy that slot out. A reader therefore only ever
/// copies a slot whose write completed before it was published.
///
/// Each slot sits behind an `RwLock` so the copy itself is race-free.
/// Readers share the lock with each other and never wait for the writer
/// except while it fills the back slot. The writer, however, can be held
/// up: a reader still cloning the slot that the next publish wants to
/// reuse blocks that publish until the clone finishes. For
/// `WorldSnapshot`, whose clone is O(N), a slow reader can therefore
/// briefly stall the engine's publish step. The `front` store happens
/// while the writer still holds the slot, so a reader can never observe a
/// newer value and afterwards an older one.
///
/// Used identically for config, stats and world metadata.
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    slots: [RwLock<T>; 2],
    front: AtomicUsize,
    writer: Mutex<()>,
}

impl<T: Clone + Default> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone> DoubleBuffer<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slots: [RwLock::new(initial.clone()), RwLock::new(initial)],
            front: AtomicUsize::new(0),
            writer: Mutex::new(()),
        }
    }

    /// Publishes `value` as the latest snapshot.
    pub fn publish(&self, value: T) {
        let _serial = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let back = 1 - self.front.load(Ordering::Relaxed);
        let mut slot = self.slots[back].write().unwrap_or_else(|e| e.into_inner());
        *slot = value;
        self.front.store(back, Ordering::Release);
    }

    /// Copies out the most recently published snapshot.
    #[must_use]
    pub fn acquire(&self) -> T {
        let front = self.front.load(Ordering::Acquire);
        let slot = self.slots[front].read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }
}
