//! In-process message layout.
//!
//! Request:  `opcode: u32 ‖ encoded args`
//! Response: `opcode: u32 ‖ encoded return value`
//!
//! The empty message is never a valid request; consumer loops treat it as
//! the shutdown sentinel.

use crate::Core::codec::{Decode, Encode};
use crate::Core::error::{Error, Result};
use crate::Core::{Frame, MessageView};

pub type Opcode = u32;

/// Build a message whose body is produced by `body` after the opcode.
pub fn build<M, F>(opcode: Opcode, body: F) -> Result<M>
where
    M: Frame,
    F: FnOnce(&mut M) -> Result<()>,
{
    let mut message = M::default();
    opcode.encode(&mut message)?;
    body(&mut message)?;
    Ok(message)
}

pub fn request<M: Frame, A: Encode + ?Sized>(opcode: Opcode, args: &A) -> Result<M> {
    build(opcode, |out| args.encode(out))
}

pub fn response<M: Frame, R: Encode + ?Sized>(opcode: Opcode, value: &R) -> Result<M> {
    build(opcode, |out| value.encode(out))
}

/// Split a message into its opcode and a view over the rest.
pub fn open(message: &[u8]) -> Result<(Opcode, MessageView<'_>)> {
    let mut view = MessageView::new(message);
    let opcode = Opcode::decode(&mut view)?;
    Ok((opcode, view))
}

/// Decode the reply to a request sent with `expected`.
pub fn read_response<R: Decode>(expected: Opcode, message: &[u8]) -> Result<R> {
    if message.is_empty() {
        return Err(Error::Disconnected);
    }
    let (found, mut view) = open(message)?;
    if found != expected {
        return Err(Error::OpcodeMismatch { expected, found });
    }
    R::decode(&mut view)
}
