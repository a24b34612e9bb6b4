use std::fmt;
use std::str::FromStr;

use crate::Core::error::Error;
use crate::Logging::format::Formatter;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

crate::codec_enum!(Severity: u8 { Trace, Debug, Info, Warn, Error, Fatal });

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(Error::format(format!("unknown severity `{other}`"))),
        }
    }
}

/// Source position of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: &'static str,
    pub module: &'static str,
    pub line: u32,
    pub column: u32,
}

impl Location {
    /// Placeholder for records that have no call site, such as lifecycle lines.
    pub const UNKNOWN: Location = Location {
        file: "",
        module: "",
        line: 0,
        column: 0,
    };
}

pub const UNNAMED: &str = "<unnamed>";

/// What the consumer knows about a producer thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedThreadInfo {
    pub id: u64,
    pub name: String,
    /// Id of the parent thread, 0 when unknown.
    pub parent: u64,
}

impl CachedThreadInfo {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: UNNAMED.to_owned(),
            parent: 0,
        }
    }
}

/// Fixed part of a `print` record, written on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct LoggingEvent {
    pub severity: Severity,
    pub thread: u64,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
    pub formatter: Formatter,
}

crate::codec_struct!(LoggingEvent {
    severity,
    thread,
    timestamp,
    formatter
});

/// A finished record as handed to sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub thread: CachedThreadInfo,
    pub timestamp: u64,
    pub location: Location,
    pub text: String,
}
