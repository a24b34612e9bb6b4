use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Logging::message::{CachedThreadInfo, Message};

pub mod terminal;

pub use terminal::Terminal;

/// Destination for finished records and thread lifecycle events.
///
/// Called from the logging consumer thread only. Lifecycle callbacks
/// default to doing nothing.
pub trait Sink: Send + Sync {
    fn print(&self, message: &Message);

    fn spawn(&self, _timestamp: u64, _thread: &CachedThreadInfo) {}

    fn exit(&self, _timestamp: u64, _thread: &CachedThreadInfo) {}

    /// `thread` still carries the old name.
    fn rename(&self, _timestamp: u64, _thread: &CachedThreadInfo, _name: &str) {}

    fn set_parent(&self, _timestamp: u64, _thread: &CachedThreadInfo, _parent: &CachedThreadInfo) {}
}

/// Ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn print(&self, _message: &Message) {}
}

/// Handle returned by [`SinkSet::add`], used to remove the sink again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

/// Registered sinks, shared between the logger handle and its consumer.
///
/// Sinks are called in registration order while the list lock is held.
#[derive(Default)]
pub struct SinkSet {
    sinks: Mutex<Vec<(SinkId, Arc<dyn Sink>)>>,
    next_id: AtomicU64,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: Arc<dyn Sink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.lock().push((id, sink));
        tracing::debug!(sink = id.0, "sink registered");
        id
    }

    pub fn remove(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain(|(existing, _)| *existing != id);
        let removed = sinks.len() != before;
        if removed {
            tracing::debug!(sink = id.0, "sink removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }

    /// Run `f` on every sink, in registration order.
    pub fn for_each(&self, mut f: impl FnMut(&dyn Sink)) {
        for (_, sink) in self.sinks.lock().iter() {
            f(sink.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Logging::message::{Location, Severity};

    struct Counting(Mutex<Vec<String>>);

    impl Sink for Counting {
        fn print(&self, message: &Message) {
            self.0.lock().push(message.text.clone());
        }
    }

    fn message(text: &str) -> Message {
        Message {
            severity: Severity::Info,
            thread: CachedThreadInfo::new(1),
            timestamp: 0,
            location: Location::UNKNOWN,
            text: text.to_owned(),
        }
    }

    #[test]
    fn add_remove_and_order() {
        let set = SinkSet::new();
        let first = Arc::new(Counting(Mutex::new(Vec::new())));
        let second = Arc::new(Counting(Mutex::new(Vec::new())));
        let first_id = set.add(first.clone());
        set.add(second.clone());
        set.add(Arc::new(NullSink));
        assert_eq!(set.len(), 3);

        set.for_each(|sink| sink.print(&message("a")));
        assert!(set.remove(first_id));
        assert!(!set.remove(first_id));
        set.for_each(|sink| sink.print(&message("b")));

        assert_eq!(*first.0.lock(), vec!["a"]);
        assert_eq!(*second.0.lock(), vec!["a", "b"]);
    }
}
