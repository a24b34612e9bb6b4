#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod MPMC;
#[allow(non_snake_case)]
pub mod RPC;
#[allow(non_snake_case)]
pub mod Net;
#[allow(non_snake_case)]
pub mod Logging;
#[allow(non_snake_case)]
pub mod Debug;

pub use Core::{Decode, Encode, Error, HybridBuffer, MessageView, Result};
pub use Logging::{Logger, LoggerBuilder, Severity};
pub use MPMC::{BoundedMPMC, BoundedSPSC, ChannelBuilder, EventQueue, Pipe};
pub use RPC::{Dispatcher, Method, RemoteMethod, Service};
