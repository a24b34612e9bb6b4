use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;

use super::Buffer::{BoundedMPMC, Cell};
use crate::MPMC::queue::{Receiver, Sender};

impl<T, const N: usize> BoundedMPMC<T, N> {
    const MASK: usize = {
        assert!(N >= 2, "capacity must be at least 2");
        assert!(N.is_power_of_two(), "capacity must be a power of two");
        N - 1
    };

    pub const CAPACITY: usize = N;

    /// Create an empty queue. Cell `k` starts with sequence `k`.
    pub fn new() -> Self {
        let _ = Self::MASK;
        let buffer = (0..N)
            .map(|k| Cell {
                sequence: AtomicUsize::new(k),
                data: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Self {
            buffer,
            write_pos: CachePadded::new(AtomicUsize::new(0)),
            read_pos: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    #[inline]
    fn cell(&self, pos: usize) -> &Cell<T> {
        &self.buffer[pos & Self::MASK]
    }

    /// Enqueue `value`, or hand it back if the queue is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut pos = self.write_pos.load(Relaxed);
        let cell = loop {
            let cell = self.cell(pos);
            let seq = cell.sequence.load(Acquire);
            let dif = seq.wrapping_sub(pos) as isize;

            if dif == 0 {
                // Cell is free for this lap, try to claim the position
                match self.write_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Relaxed,
                    Relaxed,
                ) {
                    Ok(_) => break cell,
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                // Consumer has not released this cell yet: full
                return Err(value);
            } else {
                // Another producer claimed it, reload
                pos = self.write_pos.load(Relaxed);
            }
        };

        unsafe { (*cell.data.get()).write(value) };
        cell.sequence.store(pos.wrapping_add(1), Release);
        Ok(())
    }

    /// Dequeue the oldest published value, if any.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.read_pos.load(Relaxed);
        let cell = loop {
            let cell = self.cell(pos);
            let seq = cell.sequence.load(Acquire);
            let dif = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if dif == 0 {
                match self.read_pos.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Relaxed,
                    Relaxed,
                ) {
                    Ok(_) => break cell,
                    Err(current) => pos = current,
                }
            } else if dif < 0 {
                // Nothing published here yet: empty
                return None;
            } else {
                pos = self.read_pos.load(Relaxed);
            }
        };

        let value = unsafe { (*cell.data.get()).assume_init_read() };
        cell.sequence.store(pos.wrapping_add(N), Release);
        Some(value)
    }

    /// Racy snapshot of emptiness.
    pub fn is_empty(&self) -> bool {
        let pos = self.read_pos.load(Relaxed);
        let seq = self.cell(pos).sequence.load(Acquire);
        (seq.wrapping_sub(pos.wrapping_add(1)) as isize) < 0
    }

    /// Racy snapshot of the number of queued values.
    pub fn len(&self) -> usize {
        let write = self.write_pos.load(Relaxed);
        let read = self.read_pos.load(Relaxed);
        write.wrapping_sub(read).min(N)
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for BoundedMPMC<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for BoundedMPMC<T, N> {
    fn drop(&mut self) {
        while self.try_pop().is_some() {}
    }
}

impl<T, const N: usize> Sender<T> for BoundedMPMC<T, N> {
    fn try_push(&self, value: T) -> Result<(), T> {
        BoundedMPMC::try_push(self, value)
    }
}

impl<T, const N: usize> Receiver<T> for BoundedMPMC<T, N> {
    fn try_pop(&self) -> Option<T> {
        BoundedMPMC::try_pop(self)
    }

    fn is_empty(&self) -> bool {
        BoundedMPMC::is_empty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn full_queue_returns_value() {
        let q = BoundedMPMC::<u32, 2>::new();
        assert!(q.try_push(1).is_ok());
        assert!(q.try_push(2).is_ok());
        assert_eq!(q.try_push(3), Err(3));
        assert_eq!(q.len(), 2);
        assert_eq!(q.try_pop(), Some(1));
        assert!(q.try_push(3).is_ok());
        assert_eq!(q.try_pop(), Some(2));
        assert_eq!(q.try_pop(), Some(3));
        assert_eq!(q.try_pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn wraps_many_laps() {
        let q = BoundedMPMC::<usize, 4>::new();
        for i in 0..1000 {
            q.try_push(i).unwrap();
            assert_eq!(q.try_pop(), Some(i));
        }
    }

    #[test]
    fn drop_releases_queued_values() {
        let tracker = Arc::new(());
        {
            let q = BoundedMPMC::<Arc<()>, 8>::new();
            for _ in 0..5 {
                q.try_push(Arc::clone(&tracker)).unwrap();
            }
            assert_eq!(Arc::strong_count(&tracker), 6);
        }
        assert_eq!(Arc::strong_count(&tracker), 1);
    }
}
