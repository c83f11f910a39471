//! Bridge between the Mosquitto broker-plugin ABI and Rust auth handlers.
//!
//! The broker invokes a small set of C-linkage entry points; this crate
//! marshals their native arguments into typed values, dispatches them to a
//! user-supplied [`handler::AuthHandler`] and translates the outcome back
//! into the fixed integer result codes the ABI expects:
//!
//! - [`marshal`] decodes option arrays, text buffers and payload buffers
//!   into owned values
//! - [`registry`] tracks live handler instances behind opaque integer
//!   handles across the init/cleanup lifecycle
//! - [`dispatch`] implements the entry points as total functions with a
//!   panic guard at the boundary
//! - [`export`] emits the broker-facing symbols for a concrete handler
//!
//! # Fault policy
//!
//! No fault crosses the ABI boundary. Marshalling errors, handler faults
//! and panics during authentication or access checks map to denial codes
//! (fail closed); invalid handles map to an internal error code and are
//! logged as protocol defects. Diagnostics flow through `tracing` only;
//! the broker sees bare integers.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod dispatch;
pub mod error;
pub mod export;
pub mod handler;
pub mod marshal;
pub mod prelude;
pub mod registry;

#[doc(hidden)]
pub use libc;
#[doc(hidden)]
pub use mosqbridge_plugin_abi as abi;

pub use dispatch::{Dispatcher, HandlerFactory, InitOutcome};
pub use error::BridgeError;
pub use handler::{AuthHandler, Decision, HandlerError, HandlerResult};
pub use marshal::OptionMap;
pub use registry::{Handle, HandleRegistry};
