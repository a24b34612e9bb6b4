use std::marker::PhantomData;

use crate::Core::error::Result;
use crate::Core::Frame;
use crate::MPMC::null::Null;
use crate::MPMC::queue::{Receiver, Sender, StopToken, WaitPolicy};
use crate::RPC::dispatch::{Dispatcher, Reply, Service};

/// Outcome of a single [`Server::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// One message was dispatched.
    Dispatched,
    /// Nothing was queued.
    Empty,
    /// The sentinel was received.
    Shutdown,
}

/// Serving half of a channel: receives, dispatches, replies.
pub struct Server<M, Rx, Tx = Null> {
    rx: Rx,
    tx: Tx,
    reply: Reply,
    policy: WaitPolicy,
    stop: Option<StopToken>,
    _message: PhantomData<fn() -> M>,
}

impl<M, Rx, Tx> Server<M, Rx, Tx> {
    pub fn new(rx: Rx, tx: Tx, reply: Reply) -> Self {
        Self {
            rx,
            tx,
            reply,
            policy: WaitPolicy::default(),
            stop: None,
            _message: PhantomData,
        }
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Let `run` return once `stop` is set and the queue has drained.
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn stop_token(&self) -> Option<&StopToken> {
        self.stop.as_ref()
    }
}

impl<M: Frame, Rx: Receiver<M>, Tx: Sender<M>> Server<M, Rx, Tx> {
    /// Dispatch messages into `service` until the sentinel arrives or the
    /// stop token is set and the queue is empty. Returns the number of
    /// dispatched messages.
    ///
    /// A dispatch error ends the loop and is returned.
    pub fn run<S: Service<Message = M>>(&self, service: &mut S) -> Result<usize> {
        let dispatcher = Dispatcher::<S>::new()?;
        self.run_with(&dispatcher, service)
    }

    pub fn run_with<S: Service<Message = M>>(
        &self,
        dispatcher: &Dispatcher<S>,
        service: &mut S,
    ) -> Result<usize> {
        tracing::debug!(service = S::NAME, "dispatch loop started");
        let mut handled = 0usize;
        while let Some(message) = self.rx.pop_with(self.policy, self.stop.as_ref(), None) {
            if message.is_empty() {
                break;
            }
            self.handle(dispatcher, service, &message)?;
            handled += 1;
        }
        tracing::debug!(service = S::NAME, handled, "dispatch loop finished");
        Ok(handled)
    }

    /// Dispatch at most one already queued message without waiting.
    pub fn poll<S: Service<Message = M>>(
        &self,
        dispatcher: &Dispatcher<S>,
        service: &mut S,
    ) -> Result<Poll> {
        match self.rx.try_pop() {
            None => Ok(Poll::Empty),
            Some(message) if message.is_empty() => Ok(Poll::Shutdown),
            Some(message) => {
                self.handle(dispatcher, service, &message)?;
                Ok(Poll::Dispatched)
            }
        }
    }

    fn handle<S: Service<Message = M>>(
        &self,
        dispatcher: &Dispatcher<S>,
        service: &mut S,
        message: &M,
    ) -> Result<()> {
        let response = dispatcher
            .dispatch(service, message.as_bytes(), self.reply)
            .inspect_err(|err| tracing::warn!(service = S::NAME, %err, "dispatch failed"))?;
        if let Some(response) = response {
            // Without a deadline push_with only returns once the value is in.
            let _ = self.tx.push_with(response, self.policy, None);
        }
        Ok(())
    }
}
