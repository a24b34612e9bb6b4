use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::MPMC::queue::{Receiver, Sender, StopToken, WaitPolicy, Waiter};

// Upper bound on one condvar sleep so a stop token set without notify is still seen.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Unbounded queue behind a mutex and condition variable.
///
/// Blocking pops park the thread instead of spinning. Call
/// [`BasicQueue::notify_all`] after stopping a token to wake waiters at once.
pub struct BasicQueue<T> {
    items: Mutex<VecDeque<T>>,
    ready: Condvar,
}

impl<T> BasicQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Wake every parked consumer.
    pub fn notify_all(&self) {
        self.ready.notify_all();
    }
}

impl<T> Default for BasicQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sender<T> for BasicQueue<T> {
    fn try_push(&self, value: T) -> Result<(), T> {
        self.items.lock().push_back(value);
        self.ready.notify_one();
        Ok(())
    }
}

impl<T> Receiver<T> for BasicQueue<T> {
    fn try_pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn pop_with(
        &self,
        policy: WaitPolicy,
        stop: Option<&StopToken>,
        timeout: Option<Duration>,
    ) -> Option<T> {
        let waiter = Waiter::new(policy, timeout);
        let mut items = self.items.lock();
        loop {
            if let Some(value) = items.pop_front() {
                return Some(value);
            }
            if stop.is_some_and(StopToken::is_stopped) {
                return None;
            }
            let timed_out = match waiter.deadline() {
                Some(deadline) => {
                    let slice = deadline.min(std::time::Instant::now() + STOP_POLL);
                    self.ready.wait_until(&mut items, slice);
                    std::time::Instant::now() >= deadline
                }
                None => {
                    self.ready.wait_for(&mut items, STOP_POLL);
                    false
                }
            };
            if timed_out {
                return items.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn fifo_and_never_full() {
        let q = BasicQueue::new();
        for i in 0..1000 {
            q.try_push(i).unwrap();
        }
        assert_eq!(q.len(), 1000);
        for i in 0..1000 {
            assert_eq!(q.try_pop(), Some(i));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn blocked_pop_wakes_on_push() {
        let q = Arc::new(BasicQueue::<u32>::new());
        let consumer = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop(None))
        };
        thread::sleep(Duration::from_millis(10));
        q.push(42u32);
        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn stop_releases_waiter() {
        let q = Arc::new(BasicQueue::<u32>::new());
        let stop = StopToken::new();
        let consumer = {
            let q = Arc::clone(&q);
            let stop = stop.clone();
            thread::spawn(move || q.pop(Some(&stop)))
        };
        thread::sleep(Duration::from_millis(10));
        stop.stop();
        q.notify_all();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn timeout_returns_none() {
        let q = BasicQueue::<u32>::new();
        let start = Instant::now();
        let got = q.pop_with(WaitPolicy::Yield, None, Some(Duration::from_millis(30)));
        assert!(got.is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
