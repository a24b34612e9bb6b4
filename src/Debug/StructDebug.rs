use std::fmt;

use crate::Core::HybridBuffer;
use crate::Logging::format::Formatter;
use crate::Logging::{Logger, LoggingService, SinkSet};
use crate::MPMC::{BasicQueue, BoundedMPMC, SpscConsumer, SpscProducer};

/// Debug function for HybridBuffer
///
/// Shows the storage kind and the first bytes; large payloads are elided.
pub fn debug_hybrid_buffer<const N: usize>(
    buffer: &HybridBuffer<N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    const PREVIEW: usize = 16;
    let bytes = buffer.as_bytes();
    let mut s = f.debug_struct("HybridBuffer");
    s.field("len", &buffer.len())
        .field("capacity", &buffer.capacity())
        .field("inline", &buffer.is_inline());
    if bytes.len() <= PREVIEW {
        s.field("bytes", &bytes).finish()
    } else {
        s.field("bytes", &&bytes[..PREVIEW]).finish_non_exhaustive()
    }
}

/// Debug function for BoundedMPMC
///
/// The length is a racy snapshot.
pub fn debug_bounded_mpmc<T, const N: usize>(
    queue: &BoundedMPMC<T, N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("BoundedMPMC")
        .field("capacity", &queue.capacity())
        .field("len", &queue.len())
        .finish_non_exhaustive()
}

pub fn debug_spsc_producer<T, const N: usize>(
    producer: &SpscProducer<T, N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("SpscProducer")
        .field("capacity", &N)
        .field("len", &producer.len())
        .finish_non_exhaustive()
}

pub fn debug_spsc_consumer<T, const N: usize>(
    consumer: &SpscConsumer<T, N>,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("SpscConsumer")
        .field("capacity", &N)
        .field("len", &consumer.len())
        .finish_non_exhaustive()
}

pub fn debug_basic_queue<T>(queue: &BasicQueue<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BasicQueue")
        .field("len", &queue.len())
        .finish_non_exhaustive()
}

/// Debug function for Formatter
///
/// Only the function address is meaningful.
pub fn debug_formatter(formatter: &Formatter, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Formatter")
        .field(&format_args!("0x{:x}", formatter.address()))
        .finish()
}

pub fn debug_sink_set(sinks: &SinkSet, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SinkSet")
        .field("sinks", &sinks.len())
        .finish_non_exhaustive()
}

pub fn debug_logger(logger: &Logger, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Logger")
        .field("minimum_severity", &logger.minimum_severity())
        .field("sinks", &logger.sinks().len())
        .finish_non_exhaustive()
}

pub fn debug_logging_service(
    service: &LoggingService,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("LoggingService")
        .field("threads", &service.thread_count())
        .finish_non_exhaustive()
}
