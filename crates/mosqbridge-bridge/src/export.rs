//! C-linkage entry points for the broker.
//!
//! [`export_plugin!`] emits the symbols the broker resolves from the
//! shared library, wired to a process-wide [`crate::dispatch::Dispatcher`]
//! created on the first `mosquitto_plugin_init`. The exported functions
//! are deliberately thin; everything testable lives in the dispatcher.
//!
//! The broker's `user_data` slot carries the issued handle as a
//! pointer-sized integer, never a Rust pointer. That round trip needs a
//! pointer wide enough for the full handle value, checked below at
//! compile time.

use std::ffi::c_void;

static_assertions::const_assert!(size_of::<*mut c_void>() >= size_of::<u64>());

/// Emit the broker-facing plugin symbols for a handler factory.
///
/// The factory expression must be `Fn() -> Box<dyn AuthHandler> + Send +
/// Sync + 'static`; it runs once per plugin initialization.
///
/// ```ignore
/// use mosqbridge_bridge::prelude::*;
///
/// struct MyHandler;
/// impl AuthHandler for MyHandler {
///     fn capabilities(&self) -> HandlerCapabilities {
///         HandlerCapabilities::BASIC_AUTH
///     }
/// }
///
/// mosqbridge_bridge::export_plugin!(|| Box::new(MyHandler));
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($factory:expr) => {
        static __MOSQBRIDGE_DISPATCHER: ::std::sync::OnceLock<$crate::dispatch::Dispatcher> =
            ::std::sync::OnceLock::new();

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_plugin_version(
            supported_version_count: $crate::libc::c_int,
            supported_versions: *const $crate::libc::c_int,
        ) -> $crate::libc::c_int {
            let supported = if supported_versions.is_null() || supported_version_count <= 0 {
                &[][..]
            } else {
                unsafe {
                    ::std::slice::from_raw_parts(
                        supported_versions,
                        supported_version_count as usize,
                    )
                }
            };
            $crate::abi::negotiate_version(supported).unwrap_or(-1)
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_plugin_init(
            _identifier: *mut ::std::ffi::c_void,
            user_data: *mut *mut ::std::ffi::c_void,
            opts: *const $crate::abi::PluginOpt,
            opt_count: $crate::libc::c_int,
        ) -> $crate::libc::c_int {
            let dispatcher = __MOSQBRIDGE_DISPATCHER
                .get_or_init(|| $crate::dispatch::Dispatcher::new($factory));
            let outcome = unsafe { dispatcher.plugin_init(opts, opt_count) };
            if let Some(handle) = outcome.handle {
                if !user_data.is_null() {
                    unsafe {
                        *user_data = handle.as_raw() as *mut ::std::ffi::c_void;
                    }
                }
            }
            outcome.code.as_raw()
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_plugin_cleanup(
            user_data: *mut ::std::ffi::c_void,
            opts: *const $crate::abi::PluginOpt,
            opt_count: $crate::libc::c_int,
        ) -> $crate::libc::c_int {
            let Some(dispatcher) = __MOSQBRIDGE_DISPATCHER.get() else {
                return $crate::abi::result_code::UNKNOWN;
            };
            let handle = $crate::registry::Handle::from_raw(user_data as u64);
            unsafe { dispatcher.plugin_cleanup(handle, opts, opt_count) }.as_raw()
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_auth_unpwd_check(
            user_data: *mut ::std::ffi::c_void,
            client: *const ::std::ffi::c_void,
            username: *const $crate::libc::c_char,
            password: *const $crate::libc::c_char,
        ) -> $crate::libc::c_int {
            let Some(dispatcher) = __MOSQBRIDGE_DISPATCHER.get() else {
                return $crate::abi::result_code::UNKNOWN;
            };
            let handle = $crate::registry::Handle::from_raw(user_data as u64);
            unsafe {
                dispatcher.basic_auth(
                    handle,
                    $crate::abi::Client::from_ptr(client),
                    username,
                    password,
                )
            }
            .as_raw()
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_auth_acl_check(
            user_data: *mut ::std::ffi::c_void,
            client: *const ::std::ffi::c_void,
            topic: *const $crate::libc::c_char,
            access: $crate::libc::c_int,
            payload: *const u8,
            payloadlen: u32,
        ) -> $crate::libc::c_int {
            let Some(dispatcher) = __MOSQBRIDGE_DISPATCHER.get() else {
                return $crate::abi::result_code::UNKNOWN;
            };
            let handle = $crate::registry::Handle::from_raw(user_data as u64);
            unsafe {
                dispatcher.acl_check(
                    handle,
                    $crate::abi::Client::from_ptr(client),
                    topic,
                    access,
                    payload,
                    payloadlen,
                )
            }
            .as_raw()
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn mosquitto_auth_psk_key_get(
            user_data: *mut ::std::ffi::c_void,
            client: *const ::std::ffi::c_void,
            hint: *const $crate::libc::c_char,
            identity: *const $crate::libc::c_char,
            key: *mut $crate::libc::c_char,
            max_key_len: $crate::libc::c_int,
        ) -> $crate::libc::c_int {
            let Some(dispatcher) = __MOSQBRIDGE_DISPATCHER.get() else {
                return $crate::abi::result_code::UNKNOWN;
            };
            let handle = $crate::registry::Handle::from_raw(user_data as u64);
            unsafe {
                dispatcher.psk_key(
                    handle,
                    $crate::abi::Client::from_ptr(client),
                    hint,
                    identity,
                    key,
                    max_key_len,
                )
            }
            .as_raw()
        }
    };
}
