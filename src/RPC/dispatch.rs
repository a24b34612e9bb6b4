use std::fmt;

use crate::Core::codec::Decode;
use crate::Core::error::{Error, Result};
use crate::Core::{Frame, MessageView};
use crate::RPC::protocol::{self, Opcode};

/// A type whose methods can be invoked through messages.
pub trait Service: Sized {
    /// Message type requests and responses travel in.
    type Message: Frame;

    const NAME: &'static str;

    /// Method table, ordered by opcode starting at 0.
    fn methods() -> Vec<Method<Self>>;
}

/// One remotely callable method of a [`Service`].
pub trait RemoteMethod {
    type Service: Service;
    type Args: crate::Core::Encode + Decode;
    type Output: crate::Core::Encode + Decode;

    const OPCODE: Opcode;
    const NAME: &'static str;

    fn invoke(service: &mut Self::Service, args: Self::Args) -> Self::Output;
}

/// Message type used by the service a method belongs to.
pub type MessageOf<C> = <<C as RemoteMethod>::Service as Service>::Message;

/// Whether the caller waits for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Blocking call: encode the return value into a response message.
    Send,
    /// Event call: drop the return value.
    Discard,
}

/// Decodes the arguments that follow the opcode, runs the method and
/// optionally builds the response.
pub type Handler<S> =
    fn(&mut S, &mut MessageView<'_>, Reply) -> Result<Option<<S as Service>::Message>>;

/// Table entry binding an opcode to its handler.
pub struct Method<S: Service> {
    name: &'static str,
    opcode: Opcode,
    handler: Handler<S>,
}

impl<S: Service> Method<S> {
    pub fn of<C: RemoteMethod<Service = S>>() -> Self {
        Self {
            name: C::NAME,
            opcode: C::OPCODE,
            handler: invoke_typed::<C>,
        }
    }

    /// Entry for a handler that reads its own payload.
    pub fn raw(name: &'static str, opcode: Opcode, handler: Handler<S>) -> Self {
        Self {
            name,
            opcode,
            handler,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }
}

impl<S: Service> fmt::Debug for Method<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("opcode", &self.opcode)
            .finish()
    }
}

fn invoke_typed<C: RemoteMethod>(
    service: &mut C::Service,
    args: &mut MessageView<'_>,
    reply: Reply,
) -> Result<Option<MessageOf<C>>> {
    let args = C::Args::decode(args)?;
    let output = C::invoke(service, args);
    match reply {
        Reply::Send => Ok(Some(protocol::response(C::OPCODE, &output)?)),
        Reply::Discard => Ok(None),
    }
}

/// Opcode-indexed jump table for one service.
pub struct Dispatcher<S: Service> {
    table: Vec<Method<S>>,
}

impl<S: Service> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .finish()
    }
}

impl<S: Service> Dispatcher<S> {
    pub fn new() -> Result<Self> {
        Self::from_methods(S::methods())
    }

    /// Build from an explicit table. Entry `i` must carry opcode `i`.
    pub fn from_methods(table: Vec<Method<S>>) -> Result<Self> {
        for (position, method) in table.iter().enumerate() {
            if method.opcode as usize != position {
                return Err(Error::MisorderedTable {
                    service: S::NAME,
                    position,
                    opcode: method.opcode,
                });
            }
        }
        Ok(Self { table })
    }

    /// Route `message` to its handler.
    pub fn dispatch(
        &self,
        service: &mut S,
        message: &[u8],
        reply: Reply,
    ) -> Result<Option<S::Message>> {
        let (opcode, mut args) = protocol::open(message)?;
        let method = self.method(opcode).ok_or(Error::UnknownOpcode {
            opcode,
            methods: self.table.len(),
        })?;
        (method.handler)(service, &mut args, reply)
    }

    pub fn method(&self, opcode: Opcode) -> Option<&Method<S>> {
        self.table.get(opcode as usize)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method<S>> {
        self.table.iter()
    }
}

/// Declare a [`RemoteMethod`] that forwards to an inherent method of the service.
///
/// ```
/// use ringwire::{remote_method, Core::HybridBuffer, Method, Service};
///
/// pub struct Counter(u64);
/// impl Counter {
///     fn add(&mut self, n: u64) -> u64 { self.0 += n; self.0 }
/// }
///
/// remote_method!(pub Add for Counter = 0, fn(n: u64) -> u64 => add);
///
/// impl Service for Counter {
///     type Message = HybridBuffer;
///     const NAME: &'static str = "counter";
///     fn methods() -> Vec<Method<Self>> { vec![Method::of::<Add>()] }
/// }
/// ```
#[macro_export]
macro_rules! remote_method {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident for $service:ty = $opcode:literal,
        fn($($arg:ident : $ty:ty),* $(,)?) -> $out:ty => $method:ident
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::RPC::RemoteMethod for $name {
            type Service = $service;
            type Args = ($($ty,)*);
            type Output = $out;

            const OPCODE: u32 = $opcode;
            const NAME: &'static str = stringify!($method);

            fn invoke(service: &mut $service, ($($arg,)*): Self::Args) -> $out {
                service.$method($($arg),*)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core::HybridBuffer;

    #[derive(Default)]
    struct Calc {
        calls: Vec<&'static str>,
    }

    impl Calc {
        fn add(&mut self, a: i32, b: i32) -> i32 {
            self.calls.push("add");
            a + b
        }

        fn neg(&mut self, a: i64) -> i64 {
            self.calls.push("neg");
            -a
        }

        fn reset(&mut self) {
            self.calls.push("reset");
        }
    }

    remote_method!(Add for Calc = 0, fn(a: i32, b: i32) -> i32 => add);
    remote_method!(Neg for Calc = 1, fn(a: i64) -> i64 => neg);
    remote_method!(Reset for Calc = 2, fn() -> () => reset);

    impl Service for Calc {
        type Message = HybridBuffer;
        const NAME: &'static str = "calc";

        fn methods() -> Vec<Method<Self>> {
            vec![Method::of::<Add>(), Method::of::<Neg>(), Method::of::<Reset>()]
        }
    }

    #[test]
    fn routes_by_opcode() {
        let dispatcher = Dispatcher::<Calc>::new().unwrap();
        let mut calc = Calc::default();

        let req: HybridBuffer = protocol::request(Neg::OPCODE, &(5i64,)).unwrap();
        let resp = dispatcher
            .dispatch(&mut calc, req.as_bytes(), Reply::Send)
            .unwrap()
            .unwrap();
        assert_eq!(protocol::read_response::<i64>(1, resp.as_bytes()).unwrap(), -5);
        assert_eq!(calc.calls, vec!["neg"]);
    }

    #[test]
    fn discard_skips_response() {
        let dispatcher = Dispatcher::<Calc>::new().unwrap();
        let mut calc = Calc::default();
        let req: HybridBuffer = protocol::request(Reset::OPCODE, &()).unwrap();
        assert!(dispatcher
            .dispatch(&mut calc, req.as_bytes(), Reply::Discard)
            .unwrap()
            .is_none());
        assert_eq!(calc.calls, vec!["reset"]);
    }

    #[test]
    fn unknown_opcode_is_an_error() {
        let dispatcher = Dispatcher::<Calc>::new().unwrap();
        let mut calc = Calc::default();
        let req: HybridBuffer = protocol::request(3, &()).unwrap();
        let err = dispatcher
            .dispatch(&mut calc, req.as_bytes(), Reply::Send)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 3, methods: 3 }));
        assert!(calc.calls.is_empty());
    }

    #[test]
    fn misordered_table_is_rejected() {
        let table = vec![Method::<Calc>::of::<Neg>(), Method::of::<Add>()];
        assert!(matches!(
            Dispatcher::from_methods(table),
            Err(Error::MisorderedTable { position: 0, opcode: 1, .. })
        ));
    }

    #[test]
    fn truncated_args_do_not_invoke() {
        let dispatcher = Dispatcher::<Calc>::new().unwrap();
        let mut calc = Calc::default();
        let req: HybridBuffer = protocol::request(Add::OPCODE, &1u8).unwrap();
        assert!(matches!(
            dispatcher.dispatch(&mut calc, req.as_bytes(), Reply::Send),
            Err(Error::Truncated { .. })
        ));
        assert!(calc.calls.is_empty());
        assert_eq!(dispatcher.method(0).map(Method::name), Some("add"));
    }
}
