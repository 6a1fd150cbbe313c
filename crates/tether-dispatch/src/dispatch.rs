use std::sync::Arc;

use tether_wire::{
    ChannelHandle, Envelope, OpKind, SharedAlloc, SharedStr, TypeDesc, UNCORRELATED, next_id,
};

use crate::error::DispatchError;
use crate::link::RuntimeLink;

/// Everything a context needs to reach the destination runtime.
///
/// Owned exclusively by one script context, which lives on exactly one
/// thread; nothing here is ever mutated concurrently with itself.
#[derive(Clone)]
pub struct DispatchState {
    pub channel: ChannelHandle,
    pub tydesc: TypeDesc,
    pub link: Arc<dyn RuntimeLink>,
    pub alloc: Arc<dyn SharedAlloc>,
}

/// Dispatch a correlated operation and return the id the destination will
/// answer to.
///
/// A `requested_id` of zero asks the correlator for a fresh id; a nonzero
/// id passes through so follow-up calls (close-by-id) reuse the one they
/// were handed. Exactly one send per call, nothing awaited; response
/// delivery and matching belong entirely to the destination runtime.
///
/// # Panics
///
/// Panics if the context's message channel was never set — a caller bug,
/// not a runtime condition.
pub fn dispatch(
    state: &DispatchState,
    op: OpKind,
    payload: SharedStr,
    requested_id: u32,
    timeout_ms: u32,
) -> Result<u32, DispatchError> {
    assert!(!state.channel.is_unset(), "dispatch on a context with no message channel set");
    let id = next_id(requested_id);
    send_envelope(state, Envelope::new(op, payload, id, timeout_ms))?;
    Ok(id)
}

/// Dispatch a fire-and-forget operation carrying correlation id 0.
///
/// Used for messages nobody will answer — stderr forwarding,
/// `post_message`, exit notices. Leaves the shared counter untouched.
///
/// # Panics
///
/// Panics if the context's message channel was never set.
pub fn dispatch_uncorrelated(
    state: &DispatchState,
    op: OpKind,
    payload: SharedStr,
    timeout_ms: u32,
) -> Result<(), DispatchError> {
    assert!(!state.channel.is_unset(), "dispatch on a context with no message channel set");
    send_envelope(state, Envelope::new(op, payload, UNCORRELATED, timeout_ms))
}

fn send_envelope(state: &DispatchState, message: Envelope) -> Result<(), DispatchError> {
    tracing::trace!(
        op = ?message.op,
        correlation_id = message.correlation_id,
        timeout_ms = message.timeout_ms,
        task = %state.channel.task,
        port = %state.channel.port,
        "dispatching"
    );
    state.link.send(&state.tydesc, state.channel, message)
}
