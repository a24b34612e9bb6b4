use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Core::clock::now_ns;
use crate::Core::codec::Encode;
use crate::Core::error::{Error, Result};
use crate::Core::thread::current_thread_id;
use crate::Logging::format::{ArgPack, Formatter};
use crate::Logging::message::{LoggingEvent, Severity};
use crate::Logging::service::{Exit, LogFrame, LoggingService, Rename, SetParent, Spawn, PRINT};
use crate::Logging::sinks::{Sink, SinkId, SinkSet};
use crate::MPMC::queue::{Receiver, Sender, StopToken, WaitPolicy};
use crate::MPMC::{BasicQueue, BoundedMPMC, Client, Null, Server};
use crate::RPC::dispatch::{RemoteMethod, Reply};
use crate::RPC::protocol;

/// Capacity of the bounded log queue.
pub const LOG_QUEUE_CAPACITY: usize = 64;

pub const ENV_LEVEL: &str = "RINGWIRE_LOG_LEVEL";
pub const ENV_TRANSPORT: &str = "RINGWIRE_LOG_TRANSPORT";

/// Queue carrying records to the consumer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Lock-free MPMC ring; producers wait per the wait policy when it is full.
    #[default]
    Bounded,
    /// Mutex and condition variable; never full, consumer parks when idle.
    Locked,
}

#[derive(Clone)]
enum LogQueue {
    Bounded(Arc<BoundedMPMC<LogFrame, LOG_QUEUE_CAPACITY>>),
    Locked(Arc<BasicQueue<LogFrame>>),
}

impl LogQueue {
    fn new(transport: Transport) -> Self {
        match transport {
            Transport::Bounded => LogQueue::Bounded(Arc::new(BoundedMPMC::new())),
            Transport::Locked => LogQueue::Locked(Arc::new(BasicQueue::new())),
        }
    }

    fn wake(&self) {
        if let LogQueue::Locked(queue) = self {
            queue.notify_all();
        }
    }
}

impl Sender<LogFrame> for LogQueue {
    fn try_push(&self, value: LogFrame) -> std::result::Result<(), LogFrame> {
        match self {
            LogQueue::Bounded(queue) => queue.try_push(value),
            LogQueue::Locked(queue) => Sender::try_push(queue, value),
        }
    }
}

impl Receiver<LogFrame> for LogQueue {
    fn try_pop(&self) -> Option<LogFrame> {
        match self {
            LogQueue::Bounded(queue) => queue.try_pop(),
            LogQueue::Locked(queue) => Receiver::try_pop(queue),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            LogQueue::Bounded(queue) => queue.is_empty(),
            LogQueue::Locked(queue) => Receiver::is_empty(queue),
        }
    }

    fn pop_with(
        &self,
        policy: WaitPolicy,
        stop: Option<&StopToken>,
        timeout: Option<Duration>,
    ) -> Option<LogFrame> {
        match self {
            LogQueue::Bounded(queue) => queue.pop_with(policy, stop, timeout),
            LogQueue::Locked(queue) => queue.pop_with(policy, stop, timeout),
        }
    }
}

/// Settings for a [`Logger`].
pub struct LoggerBuilder {
    minimum_severity: Severity,
    transport: Transport,
    policy: WaitPolicy,
    sinks: Vec<Arc<dyn Sink>>,
    thread_name: String,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            minimum_severity: Severity::Debug,
            transport: Transport::default(),
            policy: WaitPolicy::default(),
            sinks: Vec::new(),
            thread_name: "ringwire-log".to_owned(),
        }
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `RINGWIRE_LOG_LEVEL` and `RINGWIRE_LOG_TRANSPORT`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Ok(level) = std::env::var(ENV_LEVEL) {
            match level.parse() {
                Ok(severity) => builder.minimum_severity = severity,
                Err(err) => tracing::warn!(%err, "ignoring {}", ENV_LEVEL),
            }
        }
        if let Ok(transport) = std::env::var(ENV_TRANSPORT) {
            match transport.trim().to_ascii_lowercase().as_str() {
                "bounded" => builder.transport = Transport::Bounded,
                "locked" => builder.transport = Transport::Locked,
                other => tracing::warn!(value = other, "ignoring {}", ENV_TRANSPORT),
            }
        }
        builder
    }

    /// Records below `severity` are dropped on the calling thread.
    pub fn with_minimum_severity(mut self, severity: Severity) -> Self {
        self.minimum_severity = severity;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Start the consumer thread.
    pub fn build(self) -> Result<Logger> {
        let sinks = Arc::new(SinkSet::new());
        for sink in self.sinks {
            sinks.add(sink);
        }

        let queue = LogQueue::new(self.transport);
        let stop = StopToken::new();
        let server = Server::new(queue.clone(), Null, Reply::Discard)
            .with_wait_policy(self.policy)
            .with_stop_token(stop.clone());
        let mut service = LoggingService::new(Arc::clone(&sinks));
        let consumer_stop = stop.clone();

        let worker = std::thread::Builder::new()
            .name(self.thread_name)
            .spawn(move || {
                let result = server.run(&mut service);
                // Producers must not wait on a ring nobody drains any more.
                consumer_stop.stop();
                service.retire_all(now_ns());
                result
            })?;

        Ok(Logger {
            client: Client::new(queue.clone(), Null)
                .with_wait_policy(self.policy)
                .with_stop_token(stop.clone()),
            queue,
            sinks,
            minimum_severity: self.minimum_severity,
            stop,
            worker: Mutex::new(Some(worker)),
        })
    }
}

/// Asynchronous logger.
///
/// Log calls serialize their arguments and push them to a queue; a
/// dedicated consumer thread formats them and hands them to the sinks.
/// Share it across threads with `Arc`.
pub struct Logger {
    client: Client<LogFrame, LogQueue>,
    queue: LogQueue,
    sinks: Arc<SinkSet>,
    minimum_severity: Severity,
    stop: StopToken,
    worker: Mutex<Option<JoinHandle<Result<usize>>>>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.minimum_severity && !self.stop.is_stopped()
    }

    pub fn minimum_severity(&self) -> Severity {
        self.minimum_severity
    }

    /// Queue one record. Used by the `log_*!` macros.
    pub fn emit<P: ArgPack>(&self, severity: Severity, formatter: Formatter, args: &P) {
        let event = LoggingEvent {
            severity,
            thread: current_thread_id(),
            timestamp: now_ns(),
            formatter,
        };
        let record = protocol::build(PRINT, |out: &mut LogFrame| {
            event.encode(out)?;
            args.encode(out)
        });
        if let Err(err) = record.and_then(|record| self.client.send(record)) {
            tracing::warn!(%err, "dropping log record");
        }
    }

    fn notify<C>(&self, args: C::Args) -> Result<()>
    where
        C: RemoteMethod<Service = LoggingService>,
    {
        self.client.notify::<C>(args)
    }

    pub fn spawn(&self, thread: u64) -> Result<()> {
        self.notify::<Spawn>((now_ns(), thread))
    }

    pub fn exit(&self, thread: u64) -> Result<()> {
        self.notify::<Exit>((now_ns(), thread))
    }

    pub fn rename(&self, thread: u64, name: impl Into<String>) -> Result<()> {
        self.notify::<Rename>((now_ns(), thread, name.into()))
    }

    pub fn set_parent(&self, thread: u64, parent: u64) -> Result<()> {
        self.notify::<SetParent>((now_ns(), thread, parent))
    }

    /// Announce the calling thread; it is reported as exited when the guard drops.
    pub fn attach_thread(&self) -> Result<ThreadGuard<'_>> {
        let thread = current_thread_id();
        self.spawn(thread)?;
        Ok(ThreadGuard {
            logger: self,
            thread,
        })
    }

    pub fn rename_current(&self, name: impl Into<String>) -> Result<()> {
        self.rename(current_thread_id(), name)
    }

    /// Start a named thread that reports itself and its parent to this logger.
    pub fn spawn_thread<F, T>(self: &Arc<Self>, name: impl Into<String>, f: F) -> Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let logger = Arc::clone(self);
        let parent = current_thread_id();
        let name = name.into();
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let guard = logger.attach_thread();
                let _ = logger.rename_current(name);
                let _ = logger.set_parent(current_thread_id(), parent);
                let result = f();
                drop(guard);
                result
            })?;
        Ok(handle)
    }

    pub fn add_sink(&self, sink: Arc<dyn Sink>) -> SinkId {
        self.sinks.add(sink)
    }

    pub fn remove_sink(&self, id: SinkId) -> bool {
        self.sinks.remove(id)
    }

    pub fn sinks(&self) -> &Arc<SinkSet> {
        &self.sinks
    }

    /// Drain the queue, stop the consumer and wait for it.
    ///
    /// Returns the number of records dispatched over the logger's lifetime.
    /// Later calls return 0.
    pub fn shutdown(&self) -> Result<usize> {
        let Some(worker) = self.worker.lock().take() else {
            return Ok(0);
        };
        // A full ring keeps the sentinel out; the stop token still ends the loop.
        let _ = self.client.try_send(LogFrame::default());
        self.stop.stop();
        self.queue.wake();
        let result = match worker.join() {
            Ok(result) => result,
            Err(_) => Err(Error::format("logging consumer thread panicked")),
        };
        let dropped = self.discard_pending();
        if dropped > 0 {
            tracing::warn!(dropped, "log records arrived after shutdown");
        }
        result
    }

    /// Empty the queue once nobody consumes it; returns how many records were lost.
    fn discard_pending(&self) -> usize {
        let mut dropped = 0;
        while let Some(frame) = self.queue.try_pop() {
            if !frame.is_empty() {
                dropped += 1;
            }
        }
        dropped
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            tracing::warn!(%err, "logger shutdown failed");
        }
    }
}

/// Keeps the calling thread registered with a [`Logger`].
pub struct ThreadGuard<'a> {
    logger: &'a Logger,
    thread: u64,
}

impl ThreadGuard<'_> {
    pub fn thread_id(&self) -> u64 {
        self.thread
    }
}

impl Drop for ThreadGuard<'_> {
    fn drop(&mut self) {
        // After shutdown there is no one left to tell.
        let _ = self.logger.exit(self.thread);
    }
}
