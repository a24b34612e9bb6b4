// Bounded lock-free ring shared by any number of producers and consumers

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::AtomicUsize;

use crossbeam_utils::CachePadded;

/// A single cell of the ring.
pub(crate) struct Cell<T> {
    /// The sequence number of the cell. This is the core of the synchronization.
    /// - A producer holding position `pos` may write once `sequence == pos`,
    ///   then publishes `pos + 1`.
    /// - A consumer holding position `pos` may read once `sequence == pos + 1`,
    ///   then publishes `pos + N` for the producer one lap later.
    pub(crate) sequence: AtomicUsize,
    pub(crate) data: UnsafeCell<MaybeUninit<T>>,
}

/// Fixed-capacity multi-producer, multi-consumer queue.
///
/// ### Concurrency Design:
/// - **Producers**: claim a position by CAS on `write_pos`, but only after the
///   target cell's sequence shows it free. The payload is written after the
///   claim and published with a release store of the sequence.
/// - **Consumers**: the dual, on `read_pos`.
///
/// `N` must be a power of two and at least 2; this is checked at compile time.
pub struct BoundedMPMC<T, const N: usize> {
    pub(crate) buffer: Box<[Cell<T>]>,
    pub(crate) write_pos: CachePadded<AtomicUsize>,
    pub(crate) read_pos: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send, const N: usize> Send for BoundedMPMC<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for BoundedMPMC<T, N> {}
