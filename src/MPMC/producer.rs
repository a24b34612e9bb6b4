use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Core::error::{Error, Result};
use crate::Core::Frame;
use crate::MPMC::null::Null;
use crate::MPMC::queue::{Receiver, Sender, StopToken, WaitPolicy, Waiter};
use crate::RPC::dispatch::{RemoteMethod, Service};
use crate::RPC::protocol;

/// Calling half of a channel.
///
/// `notify` pushes a request and returns (event call); it exists only on
/// clients without a response queue. `call` pushes a request and pops the
/// next message as its response (blocking call); concurrent blocking calls
/// on one transport must be serialized by the caller.
///
/// A response that is not read back leaves the channel out of step, so a
/// `call` that times out waiting for it or reads a mismatched response
/// breaks the client: later calls fail with [`Error::Disconnected`].
pub struct Client<M, Tx, Rx = Null> {
    tx: Tx,
    rx: Rx,
    policy: WaitPolicy,
    timeout: Option<Duration>,
    stop: Option<StopToken>,
    broken: AtomicBool,
    _message: PhantomData<fn() -> M>,
}

impl<M, Tx, Rx> Client<M, Tx, Rx> {
    pub fn new(tx: Tx, rx: Rx) -> Self {
        Self {
            tx,
            rx,
            policy: WaitPolicy::default(),
            timeout: None,
            stop: None,
            broken: AtomicBool::new(false),
            _message: PhantomData,
        }
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound every push and response wait by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Give up on pushes with [`Error::Disconnected`] once `stop` is set.
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.policy
    }

    /// True once a `call` lost track of its response.
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

impl<M: Frame, Tx: Sender<M>, Rx> Client<M, Tx, Rx> {
    fn push(&self, message: M) -> Result<()> {
        let Some(stop) = &self.stop else {
            return self
                .tx
                .push_with(message, self.policy, self.timeout)
                .map_err(|_| Error::Timeout);
        };
        let mut waiter = Waiter::new(self.policy, self.timeout);
        let mut message = message;
        loop {
            if stop.is_stopped() {
                return Err(Error::Disconnected);
            }
            match self.tx.try_push(message) {
                Ok(()) => return Ok(()),
                Err(rejected) => message = rejected,
            }
            if !waiter.wait() {
                return Err(Error::Timeout);
            }
        }
    }

    /// Push the empty sentinel that stops the consuming loop.
    pub fn kill(&self) -> Result<()> {
        self.push(M::default())
    }
}

impl<M: Frame, Tx: Sender<M>> Client<M, Tx, Null> {
    /// Push an already built message.
    pub fn send(&self, message: M) -> Result<()> {
        self.push(message)
    }

    /// Push without waiting; a full queue hands the message back.
    pub fn try_send(&self, message: M) -> std::result::Result<(), M> {
        self.tx.try_push(message)
    }

    /// Fire-and-forget invocation of `C`.
    pub fn notify<C>(&self, args: C::Args) -> Result<()>
    where
        C: RemoteMethod,
        C::Service: Service<Message = M>,
    {
        self.push(protocol::request(C::OPCODE, &args)?)
    }
}

impl<M: Frame, Tx: Sender<M>, Rx: Receiver<M>> Client<M, Tx, Rx> {
    /// Invoke `C` and wait for its response.
    pub fn call<C>(&self, args: C::Args) -> Result<C::Output>
    where
        C: RemoteMethod,
        C::Service: Service<Message = M>,
    {
        if self.is_broken() {
            return Err(Error::Disconnected);
        }
        self.push(protocol::request(C::OPCODE, &args)?)?;
        let Some(response) = self.rx.pop_with(self.policy, None, self.timeout) else {
            self.broken.store(true, Ordering::Release);
            return Err(Error::Timeout);
        };
        protocol::read_response(C::OPCODE, response.as_bytes()).inspect_err(|err| {
            if matches!(err, Error::OpcodeMismatch { .. }) {
                self.broken.store(true, Ordering::Release);
            }
        })
    }
}

impl<M, Tx: Clone, Rx: Clone> Clone for Client<M, Tx, Rx> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            policy: self.policy,
            timeout: self.timeout,
            stop: self.stop.clone(),
            broken: AtomicBool::new(self.is_broken()),
            _message: PhantomData,
        }
    }
}
