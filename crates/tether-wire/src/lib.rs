//! Wire contract for the Tether message-dispatch bridge.
//!
//! Everything in this crate is part of the binding contract with the
//! destination runtime's decoder: the [`Envelope`] frame layout, the
//! [`SharedStr`] payload layout, the opaque [`ChannelHandle`] pair, and the
//! process-wide correlation-id counter. Field order and widths are fixed;
//! changing any of them breaks every deployed decoder.

pub mod channel;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod marshal;

pub use channel::{ChannelHandle, PortId, TaskId, TypeDesc};
pub use correlation::{UNCORRELATED, next_id};
pub use envelope::{Envelope, FRAME_HEADER_LEN, MAX_PAYLOAD_LEN, OpKind};
pub use error::WireError;
pub use marshal::{HeapAlloc, SharedAlloc, SharedStr};
