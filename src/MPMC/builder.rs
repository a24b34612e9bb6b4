use std::sync::Arc;
use std::time::Duration;

use super::consumer::Server;
use super::producer::Client;
use super::queue::{StopToken, WaitPolicy};
use super::spsc::{SpscConsumer, SpscProducer};
use super::{BoundedMPMC, BoundedSPSC, Null};
use crate::Core::Frame;
use crate::RPC::dispatch::Reply;

pub type PipeClient<M, const N: usize> = Client<M, SpscProducer<M, N>, SpscConsumer<M, N>>;
pub type PipeServer<M, const N: usize> = Server<M, SpscConsumer<M, N>, SpscProducer<M, N>>;
pub type EventClient<M, const N: usize> = Client<M, Arc<BoundedMPMC<M, N>>, Null>;
pub type EventServer<M, const N: usize> = Server<M, Arc<BoundedMPMC<M, N>>, Null>;

/// Shared settings for the channels it builds.
#[derive(Debug, Clone, Default)]
pub struct ChannelBuilder {
    policy: WaitPolicy,
    timeout: Option<Duration>,
    stop: Option<StopToken>,
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Deadline for client pushes and for waiting on a response.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    fn server<M, Rx, Tx>(&self, rx: Rx, tx: Tx, reply: Reply) -> Server<M, Rx, Tx> {
        let server = Server::new(rx, tx, reply).with_wait_policy(self.policy);
        match &self.stop {
            Some(stop) => server.with_stop_token(stop.clone()),
            None => server,
        }
    }

    fn client<M, Tx, Rx>(&self, tx: Tx, rx: Rx) -> Client<M, Tx, Rx> {
        let client = Client::new(tx, rx)
            .with_wait_policy(self.policy)
            .with_timeout(self.timeout);
        match &self.stop {
            Some(stop) => client.with_stop_token(stop.clone()),
            None => client,
        }
    }

    pub fn build_pipe<M: Frame, const N: usize>(self) -> Pipe<M, N> {
        let (request_tx, request_rx) = BoundedSPSC::split();
        let (response_tx, response_rx) = BoundedSPSC::split();
        Pipe {
            client: self.client(request_tx, response_rx),
            server: self.server(request_rx, response_tx, Reply::Send),
        }
    }

    pub fn build_event_queue<M: Frame, const N: usize>(self) -> EventQueue<M, N> {
        EventQueue {
            queue: Arc::new(BoundedMPMC::new()),
            builder: self,
        }
    }
}

/// Request/response channel over two SPSC rings: one client, one server.
pub struct Pipe<M, const N: usize> {
    client: PipeClient<M, N>,
    server: PipeServer<M, N>,
}

impl<M: Frame, const N: usize> Pipe<M, N> {
    pub fn new() -> Self {
        ChannelBuilder::new().build_pipe()
    }

    pub fn split(self) -> (PipeClient<M, N>, PipeServer<M, N>) {
        (self.client, self.server)
    }
}

impl<M: Frame, const N: usize> Default for Pipe<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire-and-forget channel over one shared MPMC ring.
///
/// Any number of clients may push; one server drains and never replies.
pub struct EventQueue<M, const N: usize> {
    queue: Arc<BoundedMPMC<M, N>>,
    builder: ChannelBuilder,
}

impl<M: Frame, const N: usize> EventQueue<M, N> {
    pub fn new() -> Self {
        ChannelBuilder::new().build_event_queue()
    }

    pub fn make_client(&self) -> EventClient<M, N> {
        self.builder.client(Arc::clone(&self.queue), Null)
    }

    pub fn make_server(&self) -> EventServer<M, N> {
        self.builder.server(Arc::clone(&self.queue), Null, Reply::Discard)
    }

    pub fn queue(&self) -> &Arc<BoundedMPMC<M, N>> {
        &self.queue
    }
}

impl<M: Frame, const N: usize> Default for EventQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
