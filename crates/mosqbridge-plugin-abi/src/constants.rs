//! Raw ABI constants.
//!
//! Values are copied from `mosquitto.h` / `mosquitto_plugin.h` and are part
//! of the broker's frozen wire contract.

use libc::c_int;

/// Plugin interface version this bridge implements.
///
/// The broker offers its supported versions at load time; see
/// [`crate::version::negotiate_version`].
pub const PLUGIN_VERSION: c_int = 5;

/// Result codes returned to the broker from every plugin entry point.
pub mod result_code {
    use libc::c_int;

    /// Operation completed successfully.
    pub const SUCCESS: c_int = 0;
    /// Out of memory.
    pub const NOMEM: c_int = 1;
    /// Invalid input supplied to the plugin.
    pub const INVAL: c_int = 3;
    /// Operation not supported.
    pub const NOT_SUPPORTED: c_int = 10;
    /// Authentication denied.
    pub const AUTH: c_int = 11;
    /// Topic access denied.
    pub const ACL_DENIED: c_int = 12;
    /// Unclassified internal error.
    pub const UNKNOWN: c_int = 13;
    /// This plugin has no opinion; the broker should ask the next one.
    pub const PLUGIN_DEFER: c_int = 17;
}

/// ACL access kinds presented to access-control checks.
pub mod acl_access {
    use libc::c_int;

    /// No access requested.
    pub const NONE: c_int = 0;
    /// Client reads a message (message delivery).
    pub const READ: c_int = 1;
    /// Client writes a message (publish).
    pub const WRITE: c_int = 2;
    /// Client subscribes to a topic filter.
    pub const SUBSCRIBE: c_int = 4;
    /// Client unsubscribes from a topic filter.
    pub const UNSUBSCRIBE: c_int = 8;
}

/// Broker log levels.
///
/// The bridge itself logs through `tracing`; these constants exist for
/// handlers that call the broker's own log function directly and are
/// otherwise pure ABI surface.
pub mod log_level {
    use libc::c_int;

    /// Informational message.
    pub const INFO: c_int = 0x01;
    /// Notice message.
    pub const NOTICE: c_int = 0x02;
    /// Warning message.
    pub const WARNING: c_int = 0x04;
    /// Error message.
    pub const ERR: c_int = 0x08;
    /// Debug message.
    pub const DEBUG: c_int = 0x10;
}
