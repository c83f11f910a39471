//! Callback dispatcher: the broker-facing entry points as total functions.
//!
//! Every method resolves its handle, marshals the native arguments,
//! invokes the handler and maps the outcome to exactly one result code.
//! A panic guard at each boundary converts any fault to an error code
//! before it can cross into the host, which has no recovery mechanism
//! for an unwinding callee.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use libc::{c_char, c_int};
use mosqbridge_plugin_abi::{
    AccessKind, Client, HandlerCapabilities, PluginOpt, ResultCode,
};

use crate::error::BridgeError;
use crate::handler::{AuthHandler, Decision, HandlerError};
use crate::marshal;
use crate::registry::{Handle, HandleRegistry};

/// Factory building a fresh handler per plugin initialization.
pub type HandlerFactory = dyn Fn() -> Box<dyn AuthHandler> + Send + Sync;

/// Outcome of plugin initialization: the code reported to the broker and
/// the handle it must pass back on every later call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOutcome {
    /// Result code for the broker.
    pub code: ResultCode,
    /// Issued instance handle; present iff `code` is success.
    pub handle: Option<Handle>,
}

impl InitOutcome {
    fn failure(code: ResultCode) -> Self {
        Self { code, handle: None }
    }
}

/// Dispatcher owning the handle registry and the handler factory.
///
/// Constructed at plugin-load time and dropped at unload; there is no
/// ambient global registry state.
pub struct Dispatcher {
    registry: HandleRegistry,
    factory: Box<HandlerFactory>,
}

impl Dispatcher {
    /// Create a dispatcher around a handler factory.
    pub fn new(factory: impl Fn() -> Box<dyn AuthHandler> + Send + Sync + 'static) -> Self {
        Self {
            registry: HandleRegistry::new(),
            factory: Box::new(factory),
        }
    }

    /// The registry of live handler instances.
    #[must_use]
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Initialize entry point.
    ///
    /// Decodes options, builds a fresh handler, runs its init hook and
    /// registers it. A handler that reports failure is never registered,
    /// so no cleanup call will arrive for the attempt.
    ///
    /// # Safety
    ///
    /// `opts`/`count` must satisfy [`marshal::decode_options`].
    pub unsafe fn plugin_init(&self, opts: *const PluginOpt, count: c_int) -> InitOutcome {
        guarded("plugin_init", InitOutcome::failure(ResultCode::Unknown), || {
            let options = match unsafe { marshal::decode_options(opts, count) } {
                Ok(map) => map,
                Err(err) => {
                    tracing::error!(%err, "plugin_init: option decoding failed");
                    return InitOutcome::failure(ResultCode::Inval);
                }
            };

            let handler: Arc<dyn AuthHandler> = Arc::from((self.factory)());
            if let Err(err) = handler.plugin_init(&options) {
                tracing::warn!(%err, "plugin_init: handler rejected initialization");
                return InitOutcome::failure(ResultCode::Unknown);
            }

            match self.registry.register(handler) {
                Ok(handle) => InitOutcome {
                    code: ResultCode::Success,
                    handle: Some(handle),
                },
                Err(err) => {
                    tracing::error!(%err, "plugin_init: registration failed");
                    InitOutcome::failure(ResultCode::NoMem)
                }
            }
        })
    }

    /// Cleanup entry point.
    ///
    /// The handle is retired before the handler's cleanup hook runs, so
    /// the registry entry cannot leak even when that hook faults, and no
    /// auth or ACL call can race the teardown.
    ///
    /// # Safety
    ///
    /// `opts`/`count` must satisfy [`marshal::decode_options`].
    pub unsafe fn plugin_cleanup(
        &self,
        handle: Handle,
        opts: *const PluginOpt,
        count: c_int,
    ) -> ResultCode {
        guarded("plugin_cleanup", ResultCode::Unknown, || {
            let handler = match self.registry.retire(handle) {
                Ok(h) => h,
                Err(err) => {
                    tracing::warn!(%err, "plugin_cleanup: host/plugin protocol mismatch");
                    return ResultCode::Unknown;
                }
            };

            let options = match unsafe { marshal::decode_options(opts, count) } {
                Ok(map) => map,
                Err(err) => {
                    tracing::error!(%err, "plugin_cleanup: option decoding failed");
                    return ResultCode::Inval;
                }
            };

            match handler.plugin_cleanup(&options) {
                Ok(()) | Err(HandlerError::Unsupported) => ResultCode::Success,
                Err(HandlerError::Fault(msg)) => {
                    let err = BridgeError::HandlerFault(msg);
                    tracing::error!(%err, "plugin_cleanup: handler cleanup fault");
                    ResultCode::Unknown
                }
            }
        })
    }

    /// Authenticate entry point.
    ///
    /// Faults and malformed buffers map to the auth denial code: access
    /// is never granted on ambiguous input.
    ///
    /// # Safety
    ///
    /// Non-null `username`/`password` must be valid NUL-terminated
    /// strings for the duration of the call.
    pub unsafe fn basic_auth(
        &self,
        handle: Handle,
        client: Client,
        username: *const c_char,
        password: *const c_char,
    ) -> ResultCode {
        guarded("basic_auth", ResultCode::Auth, || {
            let handler = match self.registry.resolve(handle) {
                Ok(h) => h,
                Err(err) => {
                    tracing::warn!(%err, "basic_auth: host/plugin protocol mismatch");
                    return ResultCode::Unknown;
                }
            };
            if !handler.capabilities().contains(HandlerCapabilities::BASIC_AUTH) {
                return ResultCode::PluginDefer;
            }

            let username = match unsafe { marshal::decode_text(username, "username") } {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "basic_auth: denied on malformed input");
                    return ResultCode::Auth;
                }
            };
            let password = match unsafe { marshal::decode_text(password, "password") } {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "basic_auth: denied on malformed input");
                    return ResultCode::Auth;
                }
            };

            match handler.basic_auth(client, &username, &password) {
                Ok(Decision::Allow) => ResultCode::Success,
                Ok(Decision::Deny) => ResultCode::Auth,
                Err(HandlerError::Unsupported) => ResultCode::PluginDefer,
                Err(HandlerError::Fault(msg)) => {
                    let err = BridgeError::HandlerFault(msg);
                    tracing::error!(%err, "basic_auth: denied on handler fault");
                    ResultCode::Auth
                }
            }
        })
    }

    /// Access-control entry point.
    ///
    /// Null and empty payload buffers stay distinct through to the
    /// handler. Faults map to the ACL denial code.
    ///
    /// # Safety
    ///
    /// A non-null `topic` must be a valid NUL-terminated string and a
    /// non-null `payload` must point to `payloadlen` readable bytes for
    /// the duration of the call.
    pub unsafe fn acl_check(
        &self,
        handle: Handle,
        client: Client,
        topic: *const c_char,
        access: c_int,
        payload: *const u8,
        payloadlen: u32,
    ) -> ResultCode {
        guarded("acl_check", ResultCode::AclDenied, || {
            let handler = match self.registry.resolve(handle) {
                Ok(h) => h,
                Err(err) => {
                    tracing::warn!(%err, "acl_check: host/plugin protocol mismatch");
                    return ResultCode::Unknown;
                }
            };
            if !handler.capabilities().contains(HandlerCapabilities::ACL_CHECK) {
                return ResultCode::PluginDefer;
            }

            let topic = match unsafe { marshal::decode_text(topic, "topic") } {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "acl_check: denied on malformed input");
                    return ResultCode::AclDenied;
                }
            };
            let Some(access) = AccessKind::from_raw(access) else {
                tracing::error!(access, "acl_check: denied on unknown access kind");
                return ResultCode::AclDenied;
            };
            let payload = unsafe { marshal::decode_bytes(payload, payloadlen) };

            match handler.acl_check(client, &topic, access, payload.as_deref()) {
                Ok(Decision::Allow) => ResultCode::Success,
                Ok(Decision::Deny) => ResultCode::AclDenied,
                Err(HandlerError::Unsupported) => ResultCode::PluginDefer,
                Err(HandlerError::Fault(msg)) => {
                    let err = BridgeError::HandlerFault(msg);
                    tracing::error!(%err, "acl_check: denied on handler fault");
                    ResultCode::AclDenied
                }
            }
        })
    }

    /// TLS-PSK key lookup entry point.
    ///
    /// A returned key is copied NUL-terminated into the broker's buffer;
    /// a key that does not fit is treated as an auth failure rather than
    /// truncated.
    ///
    /// # Safety
    ///
    /// Non-null `hint`/`identity` must be valid NUL-terminated strings
    /// and a non-null `key` must point to `max_key_len` writable bytes
    /// for the duration of the call.
    pub unsafe fn psk_key(
        &self,
        handle: Handle,
        client: Client,
        hint: *const c_char,
        identity: *const c_char,
        key: *mut c_char,
        max_key_len: c_int,
    ) -> ResultCode {
        guarded("psk_key", ResultCode::Auth, || {
            let handler = match self.registry.resolve(handle) {
                Ok(h) => h,
                Err(err) => {
                    tracing::warn!(%err, "psk_key: host/plugin protocol mismatch");
                    return ResultCode::Unknown;
                }
            };
            if !handler.capabilities().contains(HandlerCapabilities::PSK_KEY) {
                return ResultCode::PluginDefer;
            }

            let hint = match unsafe { marshal::decode_text(hint, "psk hint") } {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "psk_key: denied on malformed input");
                    return ResultCode::Auth;
                }
            };
            let identity = match unsafe { marshal::decode_text(identity, "psk identity") } {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "psk_key: denied on malformed input");
                    return ResultCode::Auth;
                }
            };

            match handler.psk_key(client, &hint, &identity) {
                Ok(Some(psk)) => unsafe { write_psk_key(&psk, key, max_key_len) },
                Ok(None) | Err(HandlerError::Unsupported) => ResultCode::PluginDefer,
                Err(HandlerError::Fault(msg)) => {
                    let err = BridgeError::HandlerFault(msg);
                    tracing::error!(%err, "psk_key: denied on handler fault");
                    ResultCode::Auth
                }
            }
        })
    }

    /// Disconnect notification entry point.
    ///
    /// Carries no access decision, so a fault maps to the internal error
    /// code instead of a denial.
    pub fn disconnect(&self, handle: Handle, client: Client, reason: c_int) -> ResultCode {
        guarded("disconnect", ResultCode::Unknown, || {
            let handler = match self.registry.resolve(handle) {
                Ok(h) => h,
                Err(err) => {
                    tracing::warn!(%err, "disconnect: host/plugin protocol mismatch");
                    return ResultCode::Unknown;
                }
            };
            if !handler.capabilities().contains(HandlerCapabilities::DISCONNECT) {
                return ResultCode::Success;
            }

            match handler.on_disconnect(client, reason) {
                Ok(()) | Err(HandlerError::Unsupported) => ResultCode::Success,
                Err(HandlerError::Fault(msg)) => {
                    let err = BridgeError::HandlerFault(msg);
                    tracing::error!(%err, "disconnect: handler fault");
                    ResultCode::Unknown
                }
            }
        })
    }
}

/// Copy a PSK key into the broker's output buffer, NUL-terminated.
///
/// # Safety
///
/// A non-null `out` must point to `max_len` writable bytes.
unsafe fn write_psk_key(psk: &str, out: *mut c_char, max_len: c_int) -> ResultCode {
    if out.is_null() || max_len <= 0 {
        tracing::error!("psk_key: broker supplied no output buffer");
        return ResultCode::Auth;
    }
    let bytes = psk.as_bytes();
    if bytes.contains(&0) {
        tracing::error!("psk_key: handler key contains interior NUL");
        return ResultCode::Auth;
    }
    // Key plus terminator must fit the broker's buffer.
    if bytes.len() >= max_len as usize {
        tracing::error!(
            key_len = bytes.len(),
            max_key_len = max_len,
            "psk_key: handler key exceeds broker buffer"
        );
        return ResultCode::Auth;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out as *mut u8, bytes.len());
        *out.add(bytes.len()) = 0;
    }
    ResultCode::Success
}

/// Run a dispatch body under a panic guard.
///
/// The host runtime cannot unwind; a panicking handler is reported on the
/// logging channel and answered with `fallback`.
fn guarded<T>(op: &'static str, fallback: T, body: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(code) => code,
        Err(payload) => {
            let err = BridgeError::HandlerFault(panic_message(payload.as_ref()).to_owned());
            tracing::error!(op, %err, "panic at plugin boundary");
            fallback
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerResult;
    use crate::marshal::OptionMap;

    struct PanickyHandler;

    impl AuthHandler for PanickyHandler {
        fn capabilities(&self) -> HandlerCapabilities {
            HandlerCapabilities::BASIC_AUTH
        }

        fn basic_auth(
            &self,
            _client: Client,
            _username: &str,
            _password: &str,
        ) -> HandlerResult<Decision> {
            panic!("handler bug")
        }
    }

    fn init(dispatcher: &Dispatcher) -> Handle {
        let outcome = unsafe { dispatcher.plugin_init(std::ptr::null(), 0) };
        assert_eq!(outcome.code, ResultCode::Success);
        match outcome.handle {
            Some(h) => h,
            None => panic!("success without handle"),
        }
    }

    #[test]
    fn test_panic_in_handler_becomes_denial() {
        let dispatcher = Dispatcher::new(|| Box::new(PanickyHandler));
        let handle = init(&dispatcher);

        let user = std::ffi::CString::new("alice").unwrap_or_default();
        let pass = std::ffi::CString::new("secret").unwrap_or_default();
        let code = unsafe {
            dispatcher.basic_auth(
                handle,
                Client::from_ptr(std::ptr::null()),
                user.as_ptr(),
                pass.as_ptr(),
            )
        };
        assert_eq!(code, ResultCode::Auth);
        // The instance survives the panic and can still be cleaned up.
        assert_eq!(
            unsafe { dispatcher.plugin_cleanup(handle, std::ptr::null(), 0) },
            ResultCode::Success
        );
    }

    struct CapabilityLessHandler;

    impl AuthHandler for CapabilityLessHandler {
        fn capabilities(&self) -> HandlerCapabilities {
            HandlerCapabilities::empty()
        }

        fn plugin_init(&self, _opts: &OptionMap) -> HandlerResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_undeclared_hook_defers_without_invocation() {
        let dispatcher = Dispatcher::new(|| Box::new(CapabilityLessHandler));
        let handle = init(&dispatcher);

        let user = std::ffi::CString::new("u").unwrap_or_default();
        let code = unsafe {
            dispatcher.basic_auth(
                handle,
                Client::from_ptr(std::ptr::null()),
                user.as_ptr(),
                user.as_ptr(),
            )
        };
        assert_eq!(code, ResultCode::PluginDefer);
    }

    #[test]
    fn test_write_psk_key_fits() {
        let mut buf = [0x7fi8 as c_char; 8];
        let code = unsafe { write_psk_key("0123456", buf.as_mut_ptr(), buf.len() as c_int) };
        assert_eq!(code, ResultCode::Success);
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn test_write_psk_key_too_long_denies() {
        let mut buf = [0 as c_char; 4];
        let code = unsafe { write_psk_key("0123", buf.as_mut_ptr(), buf.len() as c_int) };
        assert_eq!(code, ResultCode::Auth);
    }
}
