use tether_wire::{ChannelHandle, Envelope, PortId, TypeDesc};

use crate::error::DispatchError;

/// The consumed interface of the destination concurrent runtime.
///
/// Ports belong to the runtime behind this trait: the bridge holds only
/// non-owning identifiers and never assumes a handle is still valid — a
/// stale handle surfaces as a send error, never as a free.
pub trait RuntimeLink: Send + Sync {
    /// Create a delivery port owned by the destination runtime.
    fn open_port(&self) -> PortId;

    /// Release a port previously handed out by [`RuntimeLink::open_port`].
    fn close_port(&self, port: PortId);

    /// Deliver one message to `dest`. Fire-and-forget: the message is moved
    /// in and no acknowledgment is awaited.
    fn send(
        &self,
        tydesc: &TypeDesc,
        dest: ChannelHandle,
        message: Envelope,
    ) -> Result<(), DispatchError>;
}
