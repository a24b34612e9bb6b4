use crate::Core::Frame;
use crate::MPMC::queue::{Receiver, Sender};

/// Transport that drops what is pushed and only ever pops the shutdown sentinel.
///
/// Stands in for the missing reply queue of an event-only server.
#[derive(Debug, Clone, Copy, Default)]
pub struct Null;

impl<M: Frame> Sender<M> for Null {
    fn try_push(&self, _value: M) -> Result<(), M> {
        Ok(())
    }
}

impl<M: Frame> Receiver<M> for Null {
    fn try_pop(&self) -> Option<M> {
        Some(M::default())
    }

    fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core::HybridBuffer;

    #[test]
    fn pops_sentinel() {
        let msg: HybridBuffer = Null.pop(None).unwrap();
        assert!(msg.is_empty());
        Null.push(HybridBuffer::<64>::from_slice(b"gone").unwrap());
    }
}
