use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use crate::Core::codec::{from_bytes, to_frame};
use crate::Core::error::{Error, Result};
use crate::Core::{Frame, Writer};
use crate::Net::wire::{read_message, write_message, Kind, WireMessage};
use crate::RPC::dispatch::{Dispatcher, RemoteMethod, Reply, Service};
use crate::RPC::protocol;

/// Calls methods of a remote service over one TCP connection.
///
/// The opcode travels in the header; the payload holds only the arguments
/// (or the return value).
pub struct TcpClient {
    stream: TcpStream,
}

impl TcpClient {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Invoke `C` remotely and wait for its return value.
    pub fn call<C: RemoteMethod>(&mut self, args: C::Args) -> Result<C::Output> {
        let payload: Vec<u8> = to_frame(&args)?;
        write_message(
            &mut self.stream,
            &WireMessage::new(Kind::REQUEST, C::OPCODE, payload)?,
        )?;

        let reply = read_message(&mut self.stream)?.ok_or(Error::Disconnected)?;
        if reply.kind() != Kind::RESPONSE {
            return Err(Error::UnexpectedKind {
                expected: Kind::RESPONSE.bits(),
                found: reply.kind().bits(),
            });
        }
        if reply.opcode() != C::OPCODE {
            return Err(Error::OpcodeMismatch {
                expected: C::OPCODE,
                found: reply.opcode(),
            });
        }
        from_bytes(&reply.payload)
    }

    /// Invoke `C` remotely without waiting.
    pub fn notify<C: RemoteMethod>(&mut self, args: C::Args) -> Result<()> {
        let payload: Vec<u8> = to_frame(&args)?;
        write_message(
            &mut self.stream,
            &WireMessage::new(Kind::EVENT, C::OPCODE, payload)?,
        )
    }

    /// Close the sending side; the server loop ends once it has drained.
    pub fn close(&self) -> Result<()> {
        self.stream.shutdown(Shutdown::Write)?;
        Ok(())
    }
}

/// Accepts connections and serves a [`Service`] on each.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn accept(&self) -> Result<TcpStream> {
        let (stream, peer) = self.listener.accept()?;
        stream.set_nodelay(true)?;
        tracing::trace!(%peer, "connection accepted");
        Ok(stream)
    }

    /// Accept one connection and serve it until the peer closes.
    pub fn serve_one<S: Service>(&self, service: &mut S) -> Result<usize> {
        let mut stream = self.accept()?;
        serve(&mut stream, service)
    }
}

/// Serve `service` on `stream` until the peer closes. Returns the number
/// of dispatched messages.
pub fn serve<S: Service, T: Read + Write>(stream: &mut T, service: &mut S) -> Result<usize> {
    let dispatcher = Dispatcher::<S>::new()?;
    serve_with(stream, &dispatcher, service)
}

pub fn serve_with<S: Service, T: Read + Write>(
    stream: &mut T,
    dispatcher: &Dispatcher<S>,
    service: &mut S,
) -> Result<usize> {
    let mut handled = 0usize;
    while let Some(frame) = read_message(stream)? {
        let reply = if frame.kind() == Kind::REQUEST {
            Reply::Send
        } else if frame.kind() == Kind::EVENT {
            Reply::Discard
        } else {
            return Err(Error::UnexpectedKind {
                expected: Kind::REQUEST.bits(),
                found: frame.kind().bits(),
            });
        };

        let message: S::Message =
            protocol::build(frame.opcode(), |out| Writer::write(out, &frame.payload))?;
        if let Some(response) = dispatcher.dispatch(service, message.as_bytes(), reply)? {
            let (opcode, body) = protocol::open(response.as_bytes())?;
            write_message(
                stream,
                &WireMessage::new(Kind::RESPONSE, opcode, body.rest().to_vec())?,
            )?;
        }
        handled += 1;
    }
    tracing::trace!(service = S::NAME, handled, "connection closed");
    Ok(handled)
}
