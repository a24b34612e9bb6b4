use std::collections::HashMap;
use std::sync::Arc;

use crate::Core::codec::Decode;
use crate::Core::error::Result;
use crate::Core::{HybridBuffer, MessageView};
use crate::Logging::message::{CachedThreadInfo, LoggingEvent, Message};
use crate::Logging::sinks::SinkSet;
use crate::RPC::dispatch::{Method, Reply, Service};

/// Inline size of a log record before it spills to the heap.
pub const LOG_INLINE: usize = 64;

pub type LogFrame = HybridBuffer<LOG_INLINE>;

/// Opcode of the `print` method, whose payload is read by its formatter.
pub const PRINT: u32 = 4;

/// Consumer side of the logger: folds lifecycle events into the thread map
/// and turns `print` records into messages for the sinks.
///
/// Lives on the consumer thread; nothing else touches the thread map.
pub struct LoggingService {
    threads: HashMap<u64, CachedThreadInfo>,
    sinks: Arc<SinkSet>,
}

impl LoggingService {
    pub fn new(sinks: Arc<SinkSet>) -> Self {
        Self {
            threads: HashMap::new(),
            sinks,
        }
    }

    pub fn spawn(&mut self, timestamp: u64, thread: u64) {
        let info = self
            .threads
            .entry(thread)
            .or_insert_with(|| CachedThreadInfo::new(thread));
        self.sinks.for_each(|sink| sink.spawn(timestamp, info));
    }

    pub fn exit(&mut self, timestamp: u64, thread: u64) {
        let info = self
            .threads
            .remove(&thread)
            .unwrap_or_else(|| CachedThreadInfo::new(thread));
        self.sinks.for_each(|sink| sink.exit(timestamp, &info));
    }

    pub fn rename(&mut self, timestamp: u64, thread: u64, name: String) {
        let info = self
            .threads
            .entry(thread)
            .or_insert_with(|| CachedThreadInfo::new(thread));
        self.sinks.for_each(|sink| sink.rename(timestamp, info, &name));
        info.name = name;
    }

    pub fn set_parent(&mut self, timestamp: u64, thread: u64, parent: u64) {
        let parent_info = self
            .threads
            .entry(parent)
            .or_insert_with(|| CachedThreadInfo::new(parent))
            .clone();
        let info = self
            .threads
            .entry(thread)
            .or_insert_with(|| CachedThreadInfo::new(thread));
        self.sinks
            .for_each(|sink| sink.set_parent(timestamp, info, &parent_info));
        info.parent = parent;
    }

    /// Decode a `print` record, run its formatter and fan the message out.
    pub fn print(&mut self, record: &mut MessageView<'_>) -> Result<()> {
        let event = LoggingEvent::decode(record)?;
        let formatted = event.formatter.format(record)?;
        let thread = self
            .threads
            .get(&event.thread)
            .cloned()
            .unwrap_or_else(|| CachedThreadInfo::new(event.thread));
        let message = Message {
            severity: event.severity,
            thread,
            timestamp: event.timestamp,
            location: formatted.location,
            text: formatted.text,
        };
        self.sinks.for_each(|sink| sink.print(&message));
        Ok(())
    }

    /// Report every still tracked thread as exited.
    pub fn retire_all(&mut self, timestamp: u64) {
        let mut ids: Vec<u64> = self.threads.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.exit(timestamp, id);
        }
    }

    pub fn thread(&self, id: u64) -> Option<&CachedThreadInfo> {
        self.threads.get(&id)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}

crate::remote_method!(
    /// Start tracking a thread.
    pub Spawn for LoggingService = 0, fn(timestamp: u64, thread: u64) -> () => spawn
);
crate::remote_method!(
    /// Stop tracking a thread.
    pub Exit for LoggingService = 1, fn(timestamp: u64, thread: u64) -> () => exit
);
crate::remote_method!(
    pub Rename for LoggingService = 2,
    fn(timestamp: u64, thread: u64, name: String) -> () => rename
);
crate::remote_method!(
    pub SetParent for LoggingService = 3,
    fn(timestamp: u64, thread: u64, parent: u64) -> () => set_parent
);

fn handle_print(
    service: &mut LoggingService,
    record: &mut MessageView<'_>,
    _reply: Reply,
) -> Result<Option<LogFrame>> {
    // One bad record must not take the consumer down with it.
    if let Err(err) = service.print(record) {
        tracing::warn!(%err, "dropping unprintable log record");
    }
    Ok(None)
}

impl Service for LoggingService {
    type Message = LogFrame;
    const NAME: &'static str = "logging";

    fn methods() -> Vec<Method<Self>> {
        vec![
            Method::of::<Spawn>(),
            Method::of::<Exit>(),
            Method::of::<Rename>(),
            Method::of::<SetParent>(),
            Method::raw("print", PRINT, handle_print),
        ]
    }
}
