//! Engine side of the Tether bridge: rhai contexts wired to a message
//! channel.
//!
//! One [`ScriptRuntime`] per worker thread (see [`thread_runtime`]); each
//! context owns its engine and scope and never leaves its thread. Bridge
//! calls are synchronous and non-blocking — a script's `connect` returns as
//! soon as the envelope is handed to the destination runtime, and any reply
//! arrives later on the destination side under the returned correlation id.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tether_dispatch::MessageHub;
//! use tether_script::thread_runtime;
//! use tether_wire::{HeapAlloc, TypeDesc};
//!
//! # fn main() -> anyhow::Result<()> {
//! let hub = Arc::new(MessageHub::new());
//! let (channel, mut inbox) = hub.register_port();
//!
//! let runtime = thread_runtime(64 * 1024 * 1024);
//! let mut ctx = runtime.create_context();
//! ctx.set_message_channel(channel, TypeDesc::ENVELOPE, hub.clone(), Arc::new(HeapAlloc));
//!
//! ctx.eval(r#"let id = connect("example.org:7777"); close(id);"#)?;
//! let connect = inbox.try_recv()?;
//! assert_eq!(connect.payload.text(), "example.org:7777");
//! # Ok(())
//! # }
//! ```

pub mod bindings;
pub mod context;
pub mod error;
pub mod runtime;

pub use bindings::{Port, force_exit};
pub use context::ScriptContext;
pub use error::ScriptError;
pub use runtime::{EngineLimits, ScriptRuntime, thread_runtime};
