use std::io::{self, Write};

use parking_lot::Mutex;

use super::Sink;
use crate::Core::clock::time_of_day;
use crate::Logging::message::{CachedThreadInfo, Location, Message, Severity};

/// Writes one line per record to stdout, or to any writer.
///
/// Line layout: `HH:MM:SS.mmm LEVEL [name#id] file:line | text`.
/// Lifecycle events are printed as `DEBUG` lines.
pub struct Terminal {
    minimum_severity: Severity,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Terminal {
    pub fn new(minimum_severity: Severity) -> Self {
        Self::with_writer(minimum_severity, io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(minimum_severity: Severity, out: W) -> Self {
        Self {
            minimum_severity,
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn minimum_severity(&self) -> Severity {
        self.minimum_severity
    }

    pub fn render(message: &Message) -> String {
        let mut line = format!(
            "{} {:<5} [{}#{}]",
            time_of_day(message.timestamp),
            message.severity,
            message.thread.name,
            message.thread.id,
        );
        if message.location != Location::UNKNOWN {
            line.push_str(&format!(" {}:{}", message.location.file, message.location.line));
        }
        line.push_str(" | ");
        line.push_str(&message.text);
        line
    }

    fn lifecycle(&self, timestamp: u64, thread: &CachedThreadInfo, text: String) {
        self.print(&Message {
            severity: Severity::Debug,
            thread: thread.clone(),
            timestamp,
            location: Location::UNKNOWN,
            text,
        });
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(Severity::Debug)
    }
}

impl Sink for Terminal {
    fn print(&self, message: &Message) {
        if message.severity < self.minimum_severity {
            return;
        }
        let line = Self::render(message);
        let mut out = self.out.lock();
        if let Err(err) = writeln!(out, "{line}") {
            tracing::warn!(%err, "terminal sink write failed");
        }
    }

    fn spawn(&self, timestamp: u64, thread: &CachedThreadInfo) {
        self.lifecycle(timestamp, thread, format!("thread {} started", thread.id));
    }

    fn exit(&self, timestamp: u64, thread: &CachedThreadInfo) {
        self.lifecycle(
            timestamp,
            thread,
            format!("thread {} `{}` exited", thread.id, thread.name),
        );
    }

    fn rename(&self, timestamp: u64, thread: &CachedThreadInfo, name: &str) {
        self.lifecycle(
            timestamp,
            thread,
            format!("thread {} `{}` renamed to `{}`", thread.id, thread.name, name),
        );
    }

    fn set_parent(&self, timestamp: u64, thread: &CachedThreadInfo, parent: &CachedThreadInfo) {
        self.lifecycle(
            timestamp,
            thread,
            format!(
                "thread {} `{}` parent set to {} `{}`",
                thread.id, thread.name, parent.id, parent.name
            ),
        );
    }
}
