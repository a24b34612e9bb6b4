//! Asynchronous logging on top of the RPC layer.
//!
//! Producers serialize a record (severity, thread, timestamp, formatter and
//! raw arguments) into a [`LogFrame`] and push it to a queue. The consumer
//! thread dispatches it into [`LoggingService`], which renders the text and
//! fans it out to every registered [`Sink`].

pub mod format;
pub mod logger;
pub mod message;
pub mod service;
pub mod sinks;

pub use format::{Formatter, LogArg, LogValue};
pub use logger::{Logger, LoggerBuilder, ThreadGuard, Transport};
pub use message::{CachedThreadInfo, Location, LoggingEvent, Message, Severity, UNNAMED};
pub use service::{LogFrame, LoggingService};
pub use sinks::{NullSink, Sink, SinkId, SinkSet, Terminal};
