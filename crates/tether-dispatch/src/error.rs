use tether_wire::{PortId, TaskId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("destination task {0} is not served by this link")]
    UnknownTask(TaskId),

    #[error("destination port {0} is not registered")]
    UnknownPort(PortId),

    #[error("destination port {0} is closed")]
    PortClosed(PortId),

    #[error(transparent)]
    Wire(#[from] tether_wire::WireError),
}
