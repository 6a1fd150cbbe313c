//! Runtime-boundary side of the Tether bridge.
//!
//! A script context dispatches through its [`DispatchState`]: the
//! correlator resolves an id, the envelope is assembled, and
//! [`RuntimeLink::send`] moves it to the destination runtime —
//! fire-and-forget, exactly one send per call, nothing awaited.
//! [`MessageHub`] is the in-memory reference delivery implementation;
//! production hosts put their own runtime behind [`RuntimeLink`].

pub mod dispatch;
pub mod error;
pub mod hub;
pub mod link;

pub use dispatch::{DispatchState, dispatch, dispatch_uncorrelated};
pub use error::DispatchError;
pub use hub::MessageHub;
pub use link::RuntimeLink;
