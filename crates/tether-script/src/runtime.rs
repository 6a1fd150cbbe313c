use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use rhai::Engine;
use serde::{Deserialize, Serialize};

use crate::context::ScriptContext;

/// Engine resource bounds, derived from the byte budget a host hands to
/// [`thread_runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Upper bound on engine-held data, in bytes.
    pub max_bytes: usize,
}

impl EngineLimits {
    /// Rough size of one engine value slot, used to turn the byte budget
    /// into element counts for the aggregate limits.
    const SLOT_BYTES: usize = 16;

    fn apply(&self, engine: &mut Engine) {
        engine.set_max_string_size(self.max_bytes);
        engine.set_max_array_size(self.max_bytes / Self::SLOT_BYTES);
        engine.set_max_map_size(self.max_bytes / Self::SLOT_BYTES);
    }
}

/// One interpreter runtime, bound to the worker thread that created it.
///
/// Contexts created from a runtime inherit its limits. Runtimes are reached
/// through [`thread_runtime`] and live as long as their thread; nothing in
/// this crate tears one down.
#[derive(Debug)]
pub struct ScriptRuntime {
    limits: EngineLimits,
}

impl ScriptRuntime {
    pub fn new(max_bytes: usize) -> ScriptRuntime {
        ScriptRuntime { limits: EngineLimits { max_bytes } }
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Build a fresh context: an engine with this runtime's limits applied,
    /// an empty scope, no message channel, and only the base library
    /// installed.
    pub fn create_context(self: &Rc<ScriptRuntime>) -> ScriptContext {
        let mut engine = Engine::new();
        self.limits.apply(&mut engine);
        ScriptContext::new(Rc::clone(self), engine)
    }
}

static THREAD_KEY_SETUP: Once = Once::new();

thread_local! {
    static THREAD_RUNTIME: RefCell<Option<Rc<ScriptRuntime>>> = RefCell::new(None);
}

/// The calling thread's interpreter runtime, created on first use.
///
/// The slot is keyed per OS thread: the first call on a thread creates a
/// runtime bounded by `max_bytes` and caches it; every later call on that
/// thread returns the cached runtime unchanged, `max_bytes` included — the
/// first caller fixes the bound for everyone after it. Runtimes never
/// migrate across threads and are reclaimed only at process exit.
pub fn thread_runtime(max_bytes: usize) -> Rc<ScriptRuntime> {
    THREAD_KEY_SETUP.call_once(|| {
        tracing::debug!("thread-runtime storage initialized");
    });

    THREAD_RUNTIME.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(runtime) = slot.as_ref() {
            return Rc::clone(runtime);
        }
        tracing::debug!(
            max_bytes,
            thread = ?std::thread::current().id(),
            "creating interpreter runtime"
        );
        let runtime = Rc::new(ScriptRuntime::new(max_bytes));
        *slot = Some(Rc::clone(&runtime));
        runtime
    })
}
