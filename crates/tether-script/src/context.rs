use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use rhai::{Dynamic, Engine, EvalAltResult, Scope};

use tether_dispatch::{DispatchState, RuntimeLink, dispatch_uncorrelated};
use tether_wire::{ChannelHandle, OpKind, SharedAlloc, SharedStr, TypeDesc};

use crate::bindings;
use crate::error::ScriptError;
use crate::runtime::ScriptRuntime;

/// Per-context bridge state, shared with the registered native functions.
pub(crate) type SharedState = Rc<RefCell<Option<DispatchState>>>;

/// One interpreter context: an engine bound to its creating thread, a
/// global scope, and the message-channel state every bridge function reads.
///
/// A context starts with only the base library (print, read_file). The I/O
/// surface appears when the host wires the context to a channel with
/// [`ScriptContext::set_message_channel`].
pub struct ScriptContext {
    runtime: Rc<ScriptRuntime>,
    engine: Engine,
    scope: Scope<'static>,
    state: SharedState,
}

impl ScriptContext {
    pub(crate) fn new(runtime: Rc<ScriptRuntime>, mut engine: Engine) -> ScriptContext {
        bindings::install_base(&mut engine);
        ScriptContext { runtime, engine, scope: Scope::new(), state: Rc::new(RefCell::new(None)) }
    }

    /// The runtime this context was created from.
    pub fn runtime(&self) -> &Rc<ScriptRuntime> {
        &self.runtime
    }

    /// Wire the context to its delivery channel and expose the I/O surface.
    ///
    /// Stores the channel, type descriptor, link and allocator — calling
    /// this again overwrites the previous wiring, last writer wins —
    /// registers the I/O functions and the `Port` type into the global
    /// namespace, and arms the error route that forwards uncaught script
    /// errors as Stderr messages.
    pub fn set_message_channel(
        &mut self,
        channel: ChannelHandle,
        tydesc: TypeDesc,
        link: Arc<dyn RuntimeLink>,
        alloc: Arc<dyn SharedAlloc>,
    ) {
        *self.state.borrow_mut() =
            Some(DispatchState { channel, tydesc, link: Arc::clone(&link), alloc });
        bindings::install_io(&mut self.engine, Rc::clone(&self.state), link);
        tracing::debug!(task = %channel.task, port = %channel.port, "message channel set");
    }

    /// Evaluate script source in this context's scope.
    ///
    /// Any error surfacing at top level — parse or runtime — goes through
    /// the error route before being returned to the caller.
    pub fn eval(&mut self, script: &str) -> Result<Dynamic, ScriptError> {
        match self.engine.eval_with_scope::<Dynamic>(&mut self.scope, script) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.forward_error(&error_text(&err));
                Err(ScriptError::from(err))
            }
        }
    }

    /// Expose a host string to script code as the global constant `_data`.
    pub fn set_data(&mut self, value: &str) {
        self.scope.push_constant("_data", value.to_string());
    }

    /// Best-effort Stderr forwarding. Marshal or send failure here is
    /// dropped: escalating would feed the error reporter back into itself.
    fn forward_error(&self, text: &str) {
        let state = self.state.borrow();
        let Some(state) = state.as_ref() else { return };
        match SharedStr::marshal(state.alloc.as_ref(), text) {
            Ok(payload) => {
                if let Err(err) = dispatch_uncorrelated(state, OpKind::Stderr, payload, 0) {
                    tracing::debug!(error = %err, "stderr forwarding dropped");
                }
            }
            Err(err) => tracing::debug!(error = %err, "stderr forwarding dropped"),
        }
    }
}

/// The text a forwarded script error carries: the thrown value for runtime
/// throws, the full rendering for everything else.
fn error_text(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
        other => other.to_string(),
    }
}
