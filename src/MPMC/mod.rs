pub mod basic;
mod builder;
mod consumer;
pub mod null;
mod producer;
pub mod queue;
pub mod spsc;

pub use basic::BasicQueue;
pub use builder::{
    ChannelBuilder, EventClient, EventQueue, EventServer, Pipe, PipeClient, PipeServer,
};
pub use consumer::{Poll, Server};
pub use null::Null;
pub use producer::Client;
pub use queue::{Receiver, Sender, StopToken, WaitPolicy};
pub use spsc::{BoundedSPSC, SpscConsumer, SpscProducer};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub use Buffer::BoundedMPMC; // re-export for stable path
}

pub use Buffer::BoundedMPMC;
