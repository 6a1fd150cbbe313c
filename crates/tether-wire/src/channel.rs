use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the destination runtime task that owns a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a delivery port registered with the destination runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub u64);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where dispatched messages are delivered: an opaque `(task, port)` pair.
///
/// A plain value — copied into context state, compared by value, never
/// dereferenced by the bridge. The destination runtime owns the port and the
/// registered task; the bridge must not assume the handle stays valid and
/// must never attempt to release it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub task: TaskId,
    pub port: PortId,
}

impl ChannelHandle {
    pub fn new(task: TaskId, port: PortId) -> ChannelHandle {
        ChannelHandle { task, port }
    }

    /// Default-constructed handles are the "unset" sentinel and must never
    /// be used to send.
    pub fn is_unset(&self) -> bool {
        self.task.0 == 0 && self.port.0 == 0
    }
}

/// Opaque payload type descriptor, forwarded verbatim to the delivery
/// interface so the destination side can pick a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDesc {
    pub id: u32,
}

impl TypeDesc {
    /// The bridge's message envelope type.
    pub const ENVELOPE: TypeDesc = TypeDesc { id: 1 };
}
