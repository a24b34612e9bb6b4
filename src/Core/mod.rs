pub mod clock;
pub mod codec;
pub mod error;
#[allow(non_snake_case)]
pub mod Buffer;
mod macros;
pub mod thread;
pub mod view;

pub use codec::{Decode, Encode};
pub use error::{Error, Result};
pub use Buffer::{Frame, HybridBuffer, Writer, DEFAULT_INLINE};
pub use view::MessageView;
