//! Handler contract for authentication and access-control policy.
//!
//! A handler is the user-supplied policy object behind the bridge. Hooks
//! are explicit trait methods with defer defaults; the set a handler
//! actually implements is declared once via [`AuthHandler::capabilities`]
//! and never probed per call.

use mosqbridge_plugin_abi::{AccessKind, Client, HandlerCapabilities};
use thiserror::Error;

use crate::marshal::OptionMap;

/// Access decision returned by policy hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Grant the request.
    Allow,
    /// Refuse the request.
    Deny,
}

/// Error a handler can signal from any hook.
#[derive(Error, Debug, Clone)]
pub enum HandlerError {
    /// Hook not implemented by this handler; the broker should consult
    /// the next plugin. Maps to the defer result code, never to a grant.
    #[error("hook not supported")]
    Unsupported,

    /// Internal handler failure. Maps to a denial-class result code on
    /// auth and ACL paths; access is never granted on a fault.
    #[error("handler fault: {0}")]
    Fault(String),
}

/// Result alias for handler hooks.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// User-supplied authentication and access-control policy.
///
/// `basic_auth` and `acl_check` may be invoked concurrently for different
/// clients; implementations must be `Send + Sync` and take `&self`.
pub trait AuthHandler: Send + Sync {
    /// Hooks this handler implements.
    ///
    /// Consulted once at registration; a hook invoked without its flag is
    /// answered with a defer code by the dispatcher and never reaches the
    /// handler.
    fn capabilities(&self) -> HandlerCapabilities;

    /// Plugin initialization with the broker's configuration directives.
    fn plugin_init(&self, _opts: &OptionMap) -> HandlerResult<()> {
        Ok(())
    }

    /// Plugin teardown with the broker's configuration directives.
    fn plugin_cleanup(&self, _opts: &OptionMap) -> HandlerResult<()> {
        Ok(())
    }

    /// Username/password check for a connecting client.
    fn basic_auth(
        &self,
        _client: Client,
        _username: &str,
        _password: &str,
    ) -> HandlerResult<Decision> {
        Err(HandlerError::Unsupported)
    }

    /// Topic access check.
    ///
    /// `payload` is `None` when the broker supplied no payload buffer and
    /// `Some(&[])` for a present but empty payload; the two are distinct.
    fn acl_check(
        &self,
        _client: Client,
        _topic: &str,
        _access: AccessKind,
        _payload: Option<&[u8]>,
    ) -> HandlerResult<Decision> {
        Err(HandlerError::Unsupported)
    }

    /// TLS-PSK key lookup; `Ok(None)` defers to the next plugin.
    fn psk_key(
        &self,
        _client: Client,
        _hint: &str,
        _identity: &str,
    ) -> HandlerResult<Option<String>> {
        Ok(None)
    }

    /// Client disconnect notification.
    fn on_disconnect(&self, _client: Client, _reason: i32) -> HandlerResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DefaultHandler;

    impl AuthHandler for DefaultHandler {
        fn capabilities(&self) -> HandlerCapabilities {
            HandlerCapabilities::empty()
        }
    }

    #[test]
    fn test_default_hooks_defer_or_pass() {
        let handler = DefaultHandler;
        let client = Client::from_ptr(std::ptr::null());

        assert!(handler.plugin_init(&OptionMap::new()).is_ok());
        assert!(handler.plugin_cleanup(&OptionMap::new()).is_ok());
        assert!(matches!(
            handler.basic_auth(client, "user", "pass"),
            Err(HandlerError::Unsupported)
        ));
        assert!(matches!(
            handler.acl_check(client, "t", AccessKind::Read, None),
            Err(HandlerError::Unsupported)
        ));
        assert!(matches!(handler.psk_key(client, "", ""), Ok(None)));
        assert!(handler.on_disconnect(client, 0).is_ok());
    }
}
