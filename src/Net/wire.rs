//! Stream framing.
//!
//! Layout:
//! ┌──────┬────────┬──────────────┬──────────────┬─────────────────┐
//! │ kind │ opcode │ checksum u16 │ size u32     │ payload (size)  │
//! │ u8   │ u8     │ LE           │ LE           │                 │
//! └──────┴────────┴──────────────┴──────────────┴─────────────────┘
//!
//! The checksum is the first two bytes (LE) of the payload's SHA-256 digest.

use std::io::{self, Read, Write};
use std::mem;

use sha2::{Digest, Sha256};

use crate::Core::error::{Error, Result};

/// Message kind flags.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kind(u8);

impl Kind {
    pub const RET: Kind = Kind(0);
    pub const REQ: Kind = Kind(1 << 1);
    pub const FNC: Kind = Kind(1 << 2);
    pub const ONEWAY: Kind = Kind(1 << 3);

    /// Blocking call expecting a response.
    pub const REQUEST: Kind = Kind(Self::FNC.0 | Self::REQ.0);
    /// Reply to a request.
    pub const RESPONSE: Kind = Kind(Self::FNC.0 | Self::RET.0);
    /// Call without a response.
    pub const EVENT: Kind = Kind(Self::FNC.0 | Self::ONEWAY.0);

    const ALL: u8 = Self::REQ.0 | Self::FNC.0 | Self::ONEWAY.0;

    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & !Self::ALL != 0 {
            return Err(Error::InvalidKind(bits));
        }
        Ok(Kind(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Kind) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn expects_reply(self) -> bool {
        self.contains(Self::REQ)
    }
}

/// Fixed 8-byte header preceding every payload on a stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub kind: Kind,
    pub opcode: u8,
    pub checksum: u16,
    pub size: u32,
}

pub const HEADER_SIZE: usize = mem::size_of::<WireHeader>();
/// Largest payload a reader accepts.
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

pub fn checksum(payload: &[u8]) -> u16 {
    let digest = Sha256::digest(payload);
    u16::from_le_bytes([digest[0], digest[1]])
}

impl WireHeader {
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0] = self.kind.bits();
        out[1] = self.opcode;
        out[2..4].copy_from_slice(&self.checksum.to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn from_bytes(raw: &[u8; HEADER_SIZE]) -> Result<Self> {
        Ok(Self {
            kind: Kind::from_bits(raw[0])?,
            opcode: raw[1],
            checksum: u16::from_le_bytes([raw[2], raw[3]]),
            size: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        })
    }
}

/// Header plus payload as read from or written to a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub header: WireHeader,
    pub payload: Vec<u8>,
}

impl WireMessage {
    /// Frame `payload`, filling in size and checksum.
    pub fn new(kind: Kind, opcode: u32, payload: Vec<u8>) -> Result<Self> {
        let opcode = u8::try_from(opcode).map_err(|_| Error::OpcodeOutOfRange(opcode))?;
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::TooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            header: WireHeader {
                kind,
                opcode,
                checksum: checksum(&payload),
                size: payload.len() as u32,
            },
            payload,
        })
    }

    pub fn kind(&self) -> Kind {
        self.header.kind
    }

    pub fn opcode(&self) -> u32 {
        self.header.opcode as u32
    }
}

/// Write one framed message.
pub fn write_message<W: Write + ?Sized>(out: &mut W, message: &WireMessage) -> Result<()> {
    out.write_all(&message.header.to_bytes())?;
    out.write_all(&message.payload)?;
    out.flush()?;
    Ok(())
}

/// Read one framed message.
///
/// Returns `Ok(None)` when the stream ends cleanly before a header starts.
pub fn read_message<R: Read + ?Sized>(input: &mut R) -> Result<Option<WireMessage>> {
    let mut raw = [0u8; HEADER_SIZE];
    let mut filled = 0;
    while filled < HEADER_SIZE {
        match input.read(&mut raw[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream closed after {filled} header bytes"),
                )
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let header = WireHeader::from_bytes(&raw)?;
    let size = header.size as usize;
    if size > MAX_PAYLOAD_SIZE {
        return Err(Error::TooLarge {
            len: size,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut payload = vec![0u8; size];
    input.read_exact(&mut payload)?;

    let actual = checksum(&payload);
    if actual != header.checksum {
        return Err(Error::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }
    Ok(Some(WireMessage { header, payload }))
}
