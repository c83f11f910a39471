//! Mosquitto plugin ABI definitions.
//!
//! This crate pins down the binary contract between the Mosquitto broker
//! host and a plugin built with the mosqbridge bridge:
//! - Version negotiation constants and helper
//! - Integer result codes and ACL access kinds with raw conversions
//! - C-compatible option entries and the opaque client token
//! - Handler capability bitflags
//!
//! # ABI Stability Guarantees
//!
//! All structures crossing the boundary are `#[repr(C)]` or
//! `#[repr(transparent)]` with layouts asserted at compile time. The raw
//! integer values match `mosquitto.h` and must never be renumbered.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod constants;
pub mod prelude;
pub mod types;
pub mod version;

pub use constants::{PLUGIN_VERSION, acl_access, log_level, result_code};
pub use types::{AccessKind, Client, HandlerCapabilities, PluginOpt, ResultCode};
pub use version::negotiate_version;
