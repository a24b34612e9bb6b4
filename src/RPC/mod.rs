pub mod dispatch;
pub mod protocol;

pub use dispatch::{Dispatcher, Handler, MessageOf, Method, RemoteMethod, Reply, Service};
