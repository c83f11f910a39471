//! Smoke tests for the exported C entry points.

use std::ffi::{CString, c_void};

use libc::c_int;
use mosqbridge_bridge::export_plugin;
use mosqbridge_bridge::prelude::*;
use mosqbridge_plugin_abi::result_code;

struct AllowAll;

impl AuthHandler for AllowAll {
    fn capabilities(&self) -> HandlerCapabilities {
        HandlerCapabilities::BASIC_AUTH | HandlerCapabilities::ACL_CHECK
    }

    fn basic_auth(
        &self,
        _client: Client,
        _username: &str,
        _password: &str,
    ) -> HandlerResult<Decision> {
        Ok(Decision::Allow)
    }

    fn acl_check(
        &self,
        _client: Client,
        _topic: &str,
        _access: AccessKind,
        _payload: Option<&[u8]>,
    ) -> HandlerResult<Decision> {
        Ok(Decision::Allow)
    }
}

export_plugin!(|| Box::new(AllowAll));

#[test]
fn test_version_negotiation_symbol() {
    let offered = [2 as c_int, 4, 5];
    let version =
        unsafe { mosquitto_plugin_version(offered.len() as c_int, offered.as_ptr()) };
    assert_eq!(version, 5);

    let unsupported = [2 as c_int, 3];
    let version =
        unsafe { mosquitto_plugin_version(unsupported.len() as c_int, unsupported.as_ptr()) };
    assert_eq!(version, -1);

    assert_eq!(unsafe { mosquitto_plugin_version(0, std::ptr::null()) }, -1);
}

#[test]
fn test_exported_lifecycle_round_trip() {
    let mut user_data: *mut c_void = std::ptr::null_mut();
    let code = unsafe {
        mosquitto_plugin_init(std::ptr::null_mut(), &mut user_data, std::ptr::null(), 0)
    };
    assert_eq!(code, result_code::SUCCESS);
    assert!(!user_data.is_null());

    let user = CString::new("alice").unwrap_or_default();
    let pass = CString::new("secret").unwrap_or_default();
    let code = unsafe {
        mosquitto_auth_unpwd_check(
            user_data,
            std::ptr::null(),
            user.as_ptr(),
            pass.as_ptr(),
        )
    };
    assert_eq!(code, result_code::SUCCESS);

    let topic = CString::new("sensors/+").unwrap_or_default();
    let code = unsafe {
        mosquitto_auth_acl_check(
            user_data,
            std::ptr::null(),
            topic.as_ptr(),
            AccessKind::Read.as_raw(),
            std::ptr::null(),
            0,
        )
    };
    assert_eq!(code, result_code::SUCCESS);

    // PSK is not in this handler's capability set: defer, not deny.
    let hint = CString::new("h").unwrap_or_default();
    let identity = CString::new("i").unwrap_or_default();
    let mut key = [0 as libc::c_char; 16];
    let code = unsafe {
        mosquitto_auth_psk_key_get(
            user_data,
            std::ptr::null(),
            hint.as_ptr(),
            identity.as_ptr(),
            key.as_mut_ptr(),
            key.len() as c_int,
        )
    };
    assert_eq!(code, result_code::PLUGIN_DEFER);

    let code = unsafe { mosquitto_plugin_cleanup(user_data, std::ptr::null(), 0) };
    assert_eq!(code, result_code::SUCCESS);

    // The retired handle is rejected afterwards.
    let code = unsafe {
        mosquitto_auth_unpwd_check(
            user_data,
            std::ptr::null(),
            user.as_ptr(),
            pass.as_ptr(),
        )
    };
    assert_eq!(code, result_code::UNKNOWN);
}
