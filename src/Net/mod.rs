pub mod tcp;
pub mod wire;

pub use tcp::{serve, serve_with, TcpClient, TcpServer};
pub use wire::{checksum, read_message, write_message, Kind, WireHeader, WireMessage, HEADER_SIZE};
