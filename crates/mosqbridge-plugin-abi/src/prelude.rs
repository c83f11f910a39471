//! Convenience re-exports for common ABI types.

pub use crate::constants::{PLUGIN_VERSION, acl_access, log_level, result_code};
pub use crate::types::{AccessKind, Client, HandlerCapabilities, PluginOpt, ResultCode};
pub use crate::version::negotiate_version;
