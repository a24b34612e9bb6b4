use std::cell::{Cell, UnsafeCell};
use std::mem::MaybeUninit;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

use crate::MPMC::queue::{Receiver, Sender};

/// Fixed-capacity single-producer, single-consumer ring.
///
/// Only reachable through the two halves returned by [`BoundedSPSC::split`],
/// which is what keeps it single-producer and single-consumer.
/// Positions grow without bound (wrapping) and are masked into the ring.
pub struct BoundedSPSC<T, const N: usize> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    write_pos: CachePadded<AtomicUsize>,
    read_pos: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send, const N: usize> Send for BoundedSPSC<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for BoundedSPSC<T, N> {}

impl<T, const N: usize> BoundedSPSC<T, N> {
    const MASK: usize = {
        assert!(N >= 2, "capacity must be at least 2");
        assert!(N.is_power_of_two(), "capacity must be a power of two");
        N - 1
    };

    pub const CAPACITY: usize = N;

    /// Create a ring and hand out its two halves.
    pub fn split() -> (SpscProducer<T, N>, SpscConsumer<T, N>) {
        let _ = Self::MASK;
        let ring = Arc::new(Self {
            slots: (0..N).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect(),
            write_pos: CachePadded::new(AtomicUsize::new(0)),
            read_pos: CachePadded::new(AtomicUsize::new(0)),
        });
        (
            SpscProducer {
                ring: Arc::clone(&ring),
                read_cache: Cell::new(0),
            },
            SpscConsumer {
                ring,
                write_cache: Cell::new(0),
            },
        )
    }

    #[inline]
    fn slot(&self, pos: usize) -> *mut MaybeUninit<T> {
        self.slots[pos & Self::MASK].get()
    }

    fn len(&self) -> usize {
        let write = self.write_pos.load(Acquire);
        let read = self.read_pos.load(Acquire);
        write.wrapping_sub(read)
    }
}

impl<T, const N: usize> Drop for BoundedSPSC<T, N> {
    fn drop(&mut self) {
        let write = *self.write_pos.get_mut();
        let mut read = *self.read_pos.get_mut();
        while read != write {
            unsafe { (*self.slot(read)).assume_init_drop() };
            read = read.wrapping_add(1);
        }
    }
}

/// Writing half of a [`BoundedSPSC`].
pub struct SpscProducer<T, const N: usize> {
    ring: Arc<BoundedSPSC<T, N>>,
    // Last observed consumer position; refreshed only when the ring looks full.
    read_cache: Cell<usize>,
}

impl<T, const N: usize> SpscProducer<T, N> {
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let pos = self.ring.write_pos.load(Relaxed);
        if pos.wrapping_sub(self.read_cache.get()) >= N {
            let read = self.ring.read_pos.load(Acquire);
            self.read_cache.set(read);
            if pos.wrapping_sub(read) >= N {
                return Err(value);
            }
        }
        unsafe { (*self.ring.slot(pos)).write(value) };
        self.ring.write_pos.store(pos.wrapping_add(1), Release);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }
}

/// Reading half of a [`BoundedSPSC`].
pub struct SpscConsumer<T, const N: usize> {
    ring: Arc<BoundedSPSC<T, N>>,
    // Last observed producer position; refreshed only when the ring looks empty.
    write_cache: Cell<usize>,
}

impl<T, const N: usize> SpscConsumer<T, N> {
    pub fn try_pop(&self) -> Option<T> {
        let pos = self.ring.read_pos.load(Relaxed);
        if pos == self.write_cache.get() {
            let write = self.ring.write_pos.load(Acquire);
            self.write_cache.set(write);
            if pos == write {
                return None;
            }
        }
        let value = unsafe { (*self.ring.slot(pos)).assume_init_read() };
        self.ring.read_pos.store(pos.wrapping_add(1), Release);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }
}

impl<T, const N: usize> Sender<T> for SpscProducer<T, N> {
    fn try_push(&self, value: T) -> Result<(), T> {
        SpscProducer::try_push(self, value)
    }
}

impl<T, const N: usize> Receiver<T> for SpscConsumer<T, N> {
    fn try_pop(&self) -> Option<T> {
        SpscConsumer::try_pop(self)
    }

    fn is_empty(&self) -> bool {
        SpscConsumer::is_empty(self)
    }
}
