//! Convenience re-exports for common bridge types.

pub use mosqbridge_plugin_abi::{
    AccessKind, Client, HandlerCapabilities, PluginOpt, ResultCode, negotiate_version,
};

pub use crate::dispatch::{Dispatcher, HandlerFactory, InitOutcome};
pub use crate::error::BridgeError;
pub use crate::handler::{AuthHandler, Decision, HandlerError, HandlerResult};
pub use crate::marshal::OptionMap;
pub use crate::registry::{Handle, HandleRegistry};
