use std::rc::Rc;
use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult, INT, Position};

use tether_dispatch::{RuntimeLink, dispatch, dispatch_uncorrelated};
use tether_wire::{OpKind, PortId, SharedStr};

use crate::context::SharedState;

/// Terminate the host process immediately with `code`, bypassing dispatch.
///
/// Nothing is flushed: messages already handed to the destination runtime
/// stay delivered, anything not yet dispatched is gone.
pub fn force_exit(code: i32) -> ! {
    std::process::exit(code);
}

/// A script-visible delivery port, owned by the destination runtime.
///
/// The engine clones values freely, so the underlying port is released when
/// the last clone drops.
#[derive(Clone)]
pub struct Port {
    inner: Rc<PortInner>,
}

struct PortInner {
    id: PortId,
    link: Arc<dyn RuntimeLink>,
}

impl Port {
    fn open(link: Arc<dyn RuntimeLink>) -> Port {
        let id = link.open_port();
        Port { inner: Rc::new(PortInner { id, link }) }
    }

    pub fn id(&self) -> PortId {
        self.inner.id
    }
}

impl Drop for PortInner {
    fn drop(&mut self) {
        self.link.close_port(self.id);
    }
}

/// Base library available before any channel is wired: stdio and file text.
pub(crate) fn install_base(engine: &mut Engine) {
    engine.on_print(|line| {
        println!("{:?} {line}", std::thread::current().id());
    });

    engine.register_fn("read_file", |path: &str| -> Result<String, Box<EvalAltResult>> {
        let bytes = std::fs::read(path)
            .map_err(|err| script_error(format!("can't open {path}: {err}")))?;
        String::from_utf8(bytes)
            .map_err(|_| script_error(format!("invalid UTF-8 in file '{path}'")))
    });
}

/// The I/O surface, registered once the context has a message channel.
pub(crate) fn install_io(engine: &mut Engine, state: SharedState, link: Arc<dyn RuntimeLink>) {
    engine.register_type_with_name::<Port>("Port");

    engine.register_fn("Port", move || Port::open(Arc::clone(&link)));

    engine.register_fn("channel", |_port: &mut Port| -> Result<Dynamic, Box<EvalAltResult>> {
        // the reply-channel protocol is unspecified on the destination side
        Err(script_error("Port::channel is not implemented".to_string()))
    });

    let st = Rc::clone(&state);
    engine.register_fn("connect", move |address: &str| -> Result<INT, Box<EvalAltResult>> {
        let id = request(&st, OpKind::Connect, address, 0, 0)?;
        Ok(INT::from(id))
    });

    let st = Rc::clone(&state);
    engine.register_fn("send", move |req_id: INT, data: &str| -> Result<(), Box<EvalAltResult>> {
        request(&st, OpKind::Send, data, correlation_arg(req_id)?, 0)?;
        Ok(())
    });

    let st = Rc::clone(&state);
    engine.register_fn("recv", move |req_id: INT, amount: &str| -> Result<(), Box<EvalAltResult>> {
        request(&st, OpKind::Recv, amount, correlation_arg(req_id)?, 0)?;
        Ok(())
    });

    let st = Rc::clone(&state);
    engine.register_fn("close", move |req_id: INT| -> Result<(), Box<EvalAltResult>> {
        request(&st, OpKind::Close, "", correlation_arg(req_id)?, 0)?;
        Ok(())
    });

    let st = Rc::clone(&state);
    engine.register_fn("timeout", move |delay_ms: INT| -> Result<INT, Box<EvalAltResult>> {
        let delay = u32::try_from(delay_ms)
            .map_err(|_| script_error(format!("timeout out of range: {delay_ms}")))?;
        let id = request(&st, OpKind::Time, "", 0, delay)?;
        Ok(INT::from(id))
    });

    let st = Rc::clone(&state);
    engine.register_fn("exit", move || -> Result<(), Box<EvalAltResult>> {
        notify(&st, OpKind::Exit, "")
    });

    let st = Rc::clone(&state);
    engine.register_fn("post_message", move |op: INT, data: &str| -> Result<(), Box<EvalAltResult>> {
        let raw = u32::try_from(op)
            .map_err(|_| script_error(format!("operation tag out of range: {op}")))?;
        let kind = OpKind::from_u32(raw).map_err(|err| script_error(err.to_string()))?;
        notify(&st, kind, data)
    });
}

/// Correlated dispatch on behalf of a script call.
fn request(
    state: &SharedState,
    op: OpKind,
    payload: &str,
    requested_id: u32,
    timeout_ms: u32,
) -> Result<u32, Box<EvalAltResult>> {
    let guard = state.borrow();
    let state = guard.as_ref().expect("I/O function registered without a message channel");
    let payload = SharedStr::marshal(state.alloc.as_ref(), payload)
        .map_err(|err| script_error(err.to_string()))?;
    dispatch(state, op, payload, requested_id, timeout_ms)
        .map_err(|err| script_error(err.to_string()))
}

/// Uncorrelated dispatch (wire id 0) on behalf of a script call.
fn notify(state: &SharedState, op: OpKind, payload: &str) -> Result<(), Box<EvalAltResult>> {
    let guard = state.borrow();
    let state = guard.as_ref().expect("I/O function registered without a message channel");
    let payload = SharedStr::marshal(state.alloc.as_ref(), payload)
        .map_err(|err| script_error(err.to_string()))?;
    dispatch_uncorrelated(state, op, payload, 0).map_err(|err| script_error(err.to_string()))
}

fn correlation_arg(value: INT) -> Result<u32, Box<EvalAltResult>> {
    u32::try_from(value).map_err(|_| script_error(format!("correlation id out of range: {value}")))
}

fn script_error(message: String) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(Dynamic::from(message), Position::NONE).into()
}
