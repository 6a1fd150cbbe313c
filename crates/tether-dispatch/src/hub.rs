use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use tether_wire::{ChannelHandle, Envelope, PortId, TaskId, TypeDesc};

use crate::error::DispatchError;
use crate::link::RuntimeLink;

static NEXT_TASK: AtomicU64 = AtomicU64::new(1);

/// In-memory implementation of [`RuntimeLink`].
///
/// One hub stands in for one destination runtime task: ports are unbounded
/// channels keyed by id, and `send` routes an envelope to the matching
/// receiver. Hosts that want a port's traffic call
/// [`MessageHub::register_port`] and keep the receiving end; ports opened by
/// script code through [`RuntimeLink::open_port`] park their receiver until
/// the host claims it with [`MessageHub::take_receiver`].
///
/// # Threading
///
/// `send` is callable from any worker thread. Delivery order is preserved
/// per sender, which is all the bridge guarantees; cross-thread ordering is
/// the consumer's concern.
pub struct MessageHub {
    task: TaskId,
    next_port: AtomicU64,
    ports: Mutex<HashMap<PortId, mpsc::UnboundedSender<Envelope>>>,
    parked: Mutex<HashMap<PortId, mpsc::UnboundedReceiver<Envelope>>>,
}

impl MessageHub {
    pub fn new() -> MessageHub {
        MessageHub {
            task: TaskId(NEXT_TASK.fetch_add(1, Ordering::Relaxed)),
            next_port: AtomicU64::new(1),
            ports: Mutex::new(HashMap::new()),
            parked: Mutex::new(HashMap::new()),
        }
    }

    /// The destination task this hub stands in for.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Open a port and keep the receiving end.
    pub fn register_port(&self) -> (ChannelHandle, mpsc::UnboundedReceiver<Envelope>) {
        let (port, rx) = self.new_port();
        tracing::debug!(task = %self.task, port = %port, "port registered");
        (ChannelHandle::new(self.task, port), rx)
    }

    /// Claim the receiver of a port opened through the link interface.
    pub fn take_receiver(&self, port: PortId) -> Option<mpsc::UnboundedReceiver<Envelope>> {
        self.parked.lock().expect("hub port table").remove(&port)
    }

    fn new_port(&self) -> (PortId, mpsc::UnboundedReceiver<Envelope>) {
        let port = PortId(self.next_port.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.ports.lock().expect("hub port table").insert(port, tx);
        (port, rx)
    }
}

impl Default for MessageHub {
    fn default() -> MessageHub {
        MessageHub::new()
    }
}

impl RuntimeLink for MessageHub {
    fn open_port(&self) -> PortId {
        let (port, rx) = self.new_port();
        self.parked.lock().expect("hub port table").insert(port, rx);
        tracing::debug!(task = %self.task, port = %port, "port opened");
        port
    }

    fn close_port(&self, port: PortId) {
        self.ports.lock().expect("hub port table").remove(&port);
        self.parked.lock().expect("hub port table").remove(&port);
        tracing::debug!(task = %self.task, port = %port, "port closed");
    }

    fn send(
        &self,
        _tydesc: &TypeDesc,
        dest: ChannelHandle,
        message: Envelope,
    ) -> Result<(), DispatchError> {
        if dest.task != self.task {
            return Err(DispatchError::UnknownTask(dest.task));
        }
        let ports = self.ports.lock().expect("hub port table");
        let tx = ports.get(&dest.port).ok_or(DispatchError::UnknownPort(dest.port))?;
        tx.send(message).map_err(|_| DispatchError::PortClosed(dest.port))
    }
}
