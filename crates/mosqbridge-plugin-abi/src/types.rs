//! ABI type definitions.
//!
//! C-compatible structures crossing the broker boundary, plus the typed
//! enumerations the bridge exposes in place of the raw integers.

use bitflags::bitflags;
use libc::{c_char, c_int, c_void};

use crate::constants::{acl_access, result_code};

/// One broker configuration directive (`struct mosquitto_opt`).
///
/// Both pointers are owned by the broker and are only valid for the
/// duration of the call that supplied them. The value pointer may be null
/// for value-less options.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginOpt {
    /// Option key, NUL-terminated.
    pub key: *mut c_char,
    /// Option value, NUL-terminated, possibly null.
    pub value: *mut c_char,
}

static_assertions::const_assert_eq!(
    std::mem::size_of::<PluginOpt>(),
    2 * std::mem::size_of::<*mut c_char>()
);

/// Opaque token for one broker client (`const struct mosquitto *`).
///
/// The bridge never dereferences this; it is handed through to the handler
/// verbatim and is valid only for the duration of the triggering callback.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client(*const c_void);

impl Client {
    /// Wrap a raw broker client pointer.
    #[must_use]
    pub fn from_ptr(ptr: *const c_void) -> Self {
        Self(ptr)
    }

    /// Raw pointer as received from the broker.
    #[must_use]
    pub fn as_ptr(self) -> *const c_void {
        self.0
    }

    /// Whether the broker supplied no client context for this call.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

static_assertions::const_assert_eq!(
    std::mem::size_of::<Client>(),
    std::mem::size_of::<*const c_void>()
);

/// Result code reported to the broker from every entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultCode {
    /// Operation completed successfully.
    Success,
    /// Out of memory.
    NoMem,
    /// Invalid input.
    Inval,
    /// Operation not supported.
    NotSupported,
    /// Authentication denied.
    Auth,
    /// Topic access denied.
    AclDenied,
    /// Unclassified internal error.
    Unknown,
    /// No opinion; the broker should consult the next plugin.
    PluginDefer,
}

impl ResultCode {
    /// Raw integer as transmitted across the ABI.
    #[must_use]
    pub fn as_raw(self) -> c_int {
        match self {
            Self::Success => result_code::SUCCESS,
            Self::NoMem => result_code::NOMEM,
            Self::Inval => result_code::INVAL,
            Self::NotSupported => result_code::NOT_SUPPORTED,
            Self::Auth => result_code::AUTH,
            Self::AclDenied => result_code::ACL_DENIED,
            Self::Unknown => result_code::UNKNOWN,
            Self::PluginDefer => result_code::PLUGIN_DEFER,
        }
    }

    /// Decode a raw integer; values outside the contract map to `Unknown`.
    #[must_use]
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            result_code::SUCCESS => Self::Success,
            result_code::NOMEM => Self::NoMem,
            result_code::INVAL => Self::Inval,
            result_code::NOT_SUPPORTED => Self::NotSupported,
            result_code::AUTH => Self::Auth,
            result_code::ACL_DENIED => Self::AclDenied,
            result_code::PLUGIN_DEFER => Self::PluginDefer,
            _ => Self::Unknown,
        }
    }

    /// Whether this code reports success to the broker.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// Kind of topic access an ACL check asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessKind {
    /// No access requested.
    None,
    /// Message delivery to the client.
    Read,
    /// Publish from the client.
    Write,
    /// Subscription to a topic filter.
    Subscribe,
    /// Unsubscription from a topic filter.
    Unsubscribe,
}

impl AccessKind {
    /// Raw integer as transmitted across the ABI.
    #[must_use]
    pub fn as_raw(self) -> c_int {
        match self {
            Self::None => acl_access::NONE,
            Self::Read => acl_access::READ,
            Self::Write => acl_access::WRITE,
            Self::Subscribe => acl_access::SUBSCRIBE,
            Self::Unsubscribe => acl_access::UNSUBSCRIBE,
        }
    }

    /// Decode a raw integer; unknown values are a contract violation and
    /// return `None`.
    #[must_use]
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            acl_access::NONE => Some(Self::None),
            acl_access::READ => Some(Self::Read),
            acl_access::WRITE => Some(Self::Write),
            acl_access::SUBSCRIBE => Some(Self::Subscribe),
            acl_access::UNSUBSCRIBE => Some(Self::Unsubscribe),
            _ => None,
        }
    }
}

bitflags! {
    /// Hooks a handler implements, declared once at construction time.
    ///
    /// The dispatcher consults these flags instead of probing hook
    /// methods per call; a hook whose flag is absent is answered with
    /// a defer code, never invoked.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandlerCapabilities: u32 {
        /// Username/password authentication.
        const BASIC_AUTH = 0b0000_0001;
        /// Topic access control.
        const ACL_CHECK  = 0b0000_0010;
        /// TLS-PSK key lookup.
        const PSK_KEY    = 0b0000_0100;
        /// Client disconnect notification.
        const DISCONNECT = 0b0000_1000;
    }
}

static_assertions::const_assert_eq!(std::mem::size_of::<HandlerCapabilities>(), 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_round_trip() {
        let all = [
            ResultCode::Success,
            ResultCode::NoMem,
            ResultCode::Inval,
            ResultCode::NotSupported,
            ResultCode::Auth,
            ResultCode::AclDenied,
            ResultCode::Unknown,
            ResultCode::PluginDefer,
        ];
        for code in all {
            assert_eq!(ResultCode::from_raw(code.as_raw()), code);
        }
    }

    #[test]
    fn test_result_code_unknown_raw() {
        assert_eq!(ResultCode::from_raw(-42), ResultCode::Unknown);
        assert_eq!(ResultCode::from_raw(9999), ResultCode::Unknown);
    }

    #[test]
    fn test_access_kind_round_trip() {
        let all = [
            AccessKind::None,
            AccessKind::Read,
            AccessKind::Write,
            AccessKind::Subscribe,
            AccessKind::Unsubscribe,
        ];
        for kind in all {
            assert_eq!(AccessKind::from_raw(kind.as_raw()), Some(kind));
        }
    }

    #[test]
    fn test_access_kind_rejects_unknown_raw() {
        assert_eq!(AccessKind::from_raw(3), None);
        assert_eq!(AccessKind::from_raw(-1), None);
        assert_eq!(AccessKind::from_raw(16), None);
    }

    #[test]
    fn test_handler_capabilities_bits() {
        let caps = HandlerCapabilities::BASIC_AUTH | HandlerCapabilities::ACL_CHECK;
        assert_eq!(caps.bits(), 0b0000_0011);
        assert!(caps.contains(HandlerCapabilities::BASIC_AUTH));
        assert!(!caps.contains(HandlerCapabilities::PSK_KEY));
    }

    #[test]
    fn test_client_null() {
        let client = Client::from_ptr(std::ptr::null());
        assert!(client.is_null());
        assert_eq!(client.as_ptr(), std::ptr::null());
    }
}
