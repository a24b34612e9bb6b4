use std::fmt;

use crate::Core::HybridBuffer;
use crate::Logging::format::Formatter;
use crate::Logging::{Logger, LoggingService, SinkSet};
use crate::MPMC::{BasicQueue, BoundedMPMC, SpscConsumer, SpscProducer};

// Debug proxy implementations that call the standalone debug functions
impl<const N: usize> fmt::Debug for HybridBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_hybrid_buffer(self, f)
    }
}

impl<T, const N: usize> fmt::Debug for BoundedMPMC<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_bounded_mpmc(self, f)
    }
}

impl<T, const N: usize> fmt::Debug for SpscProducer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_spsc_producer(self, f)
    }
}

impl<T, const N: usize> fmt::Debug for SpscConsumer<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_spsc_consumer(self, f)
    }
}

impl<T> fmt::Debug for BasicQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_basic_queue(self, f)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_formatter(self, f)
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_sink_set(self, f)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_logger(self, f)
    }
}

impl fmt::Debug for LoggingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::StructDebug::debug_logging_service(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_debug_elides_long_payloads() {
        let short = HybridBuffer::<8>::from_slice(b"abc").unwrap();
        let text = format!("{short:?}");
        assert!(text.contains("inline: true"));
        assert!(text.contains("[97, 98, 99]"));

        let long = HybridBuffer::<8>::from_slice(&[7u8; 40]).unwrap();
        let text = format!("{long:?}");
        assert!(text.contains("inline: false"));
        assert!(text.ends_with(".. }"));
    }

    #[test]
    fn queue_debug_reports_len() {
        let queue = BoundedMPMC::<u8, 4>::new();
        queue.try_push(1).unwrap();
        assert_eq!(format!("{queue:?}"), "BoundedMPMC { capacity: 4, len: 1, .. }");
    }
}
