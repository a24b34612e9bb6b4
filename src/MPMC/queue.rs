use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::Backoff;

use crate::Core::error::Result;

/// How a blocking queue operation waits between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Busy-spin with a CPU hint.
    Spin,
    /// Yield the thread between retries.
    #[default]
    Yield,
    /// Spin, then yield, with exponential growth (crossbeam `Backoff`).
    Backoff,
}

/// Retry pacing for one blocking operation.
pub(crate) struct Waiter {
    policy: WaitPolicy,
    backoff: Backoff,
    deadline: Option<Instant>,
}

impl Waiter {
    pub(crate) fn new(policy: WaitPolicy, timeout: Option<Duration>) -> Self {
        Self {
            policy,
            backoff: Backoff::new(),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Pause once. Returns false when the deadline has passed.
    pub(crate) fn wait(&mut self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return false;
            }
        }
        match self.policy {
            WaitPolicy::Spin => std::hint::spin_loop(),
            WaitPolicy::Yield => std::thread::yield_now(),
            WaitPolicy::Backoff => self.backoff.snooze(),
        }
        true
    }
}

/// Cooperative cancellation flag shared between a consumer loop and its owner.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop this token when the process receives Ctrl+C.
    ///
    /// Only one handler can be installed per process.
    pub fn stop_on_ctrlc(&self) -> Result<()> {
        let token = self.clone();
        ctrlc::set_handler(move || token.stop())?;
        Ok(())
    }
}

/// Producing side of a queue.
pub trait Sender<T> {
    /// Enqueue without waiting. A full queue hands the value back.
    fn try_push(&self, value: T) -> std::result::Result<(), T>;

    /// Enqueue, waiting per `policy`. Gives the value back if `timeout` runs out.
    fn push_with(
        &self,
        mut value: T,
        policy: WaitPolicy,
        timeout: Option<Duration>,
    ) -> std::result::Result<(), T> {
        let mut waiter = Waiter::new(policy, timeout);
        loop {
            match self.try_push(value) {
                Ok(()) => return Ok(()),
                Err(rejected) => value = rejected,
            }
            if !waiter.wait() {
                return Err(value);
            }
        }
    }

    /// Enqueue, yielding until there is room.
    fn push(&self, value: T) {
        // Without a deadline push_with only returns once the value is in.
        let _ = self.push_with(value, WaitPolicy::Yield, None);
    }
}

/// Consuming side of a queue.
pub trait Receiver<T> {
    /// Dequeue without waiting.
    fn try_pop(&self) -> Option<T>;

    /// Racy snapshot; not a synchronization point.
    fn is_empty(&self) -> bool;

    /// Dequeue, waiting per `policy`.
    ///
    /// Returns `None` when `timeout` runs out, or when `stop` is set and the
    /// queue has drained.
    fn pop_with(
        &self,
        policy: WaitPolicy,
        stop: Option<&StopToken>,
        timeout: Option<Duration>,
    ) -> Option<T> {
        let mut waiter = Waiter::new(policy, timeout);
        loop {
            if let Some(value) = self.try_pop() {
                return Some(value);
            }
            if stop.is_some_and(StopToken::is_stopped) {
                // One last look so nothing queued before the stop is lost.
                return self.try_pop();
            }
            if !waiter.wait() {
                return None;
            }
        }
    }

    /// Dequeue, yielding until a value arrives or `stop` is set.
    fn pop(&self, stop: Option<&StopToken>) -> Option<T> {
        self.pop_with(WaitPolicy::Yield, stop, None)
    }
}

impl<T, Q: Sender<T> + ?Sized> Sender<T> for Arc<Q> {
    fn try_push(&self, value: T) -> std::result::Result<(), T> {
        (**self).try_push(value)
    }

    fn push_with(
        &self,
        value: T,
        policy: WaitPolicy,
        timeout: Option<Duration>,
    ) -> std::result::Result<(), T> {
        (**self).push_with(value, policy, timeout)
    }
}

impl<T, Q: Receiver<T> + ?Sized> Receiver<T> for Arc<Q> {
    fn try_pop(&self) -> Option<T> {
        (**self).try_pop()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn pop_with(
        &self,
        policy: WaitPolicy,
        stop: Option<&StopToken>,
        timeout: Option<Duration>,
    ) -> Option<T> {
        (**self).pop_with(policy, stop, timeout)
    }
}
