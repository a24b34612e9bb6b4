use thiserror::Error;

/// Errors produced anywhere in the messaging substrate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("truncated message: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("invalid discriminant {value} for {type_name}")]
    InvalidDiscriminant { type_name: &'static str, value: u64 },

    #[error("invalid utf-8 in string payload")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("formatter address is null")]
    NullFormatter,

    #[error("unknown opcode {opcode} (service has {methods} methods)")]
    UnknownOpcode { opcode: u32, methods: usize },

    #[error("method table of {service} is out of order: position {position} holds opcode {opcode}")]
    MisorderedTable {
        service: &'static str,
        position: usize,
        opcode: u32,
    },

    #[error("response opcode {found} does not match request opcode {expected}")]
    OpcodeMismatch { expected: u32, found: u32 },

    #[error("opcode {0} does not fit the one-byte wire field")]
    OpcodeOutOfRange(u32),

    #[error("allocation of {requested} bytes failed")]
    Alloc { requested: usize },

    #[error("length {len} exceeds limit {max}")]
    TooLarge { len: usize, max: usize },

    #[error("checksum mismatch: header {expected:#06x}, payload {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    #[error("unknown message kind bits {0:#04x}")]
    InvalidKind(u8),

    #[error("expected message kind {expected:#04x}, found {found:#04x}")]
    UnexpectedKind { expected: u8, found: u8 },

    #[error("format error: {0}")]
    Format(String),

    #[error("timed out waiting on queue")]
    Timeout,

    #[error("queue stopped")]
    Disconnected,

    #[error("signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn truncated(needed: usize, remaining: usize) -> Self {
        Self::Truncated { needed, remaining }
    }

    pub fn discriminant<T: ?Sized>(value: u64) -> Self {
        Self::InvalidDiscriminant {
            type_name: std::any::type_name::<T>(),
            value,
        }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// True when the peer closed a stream cleanly or mid-frame.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
