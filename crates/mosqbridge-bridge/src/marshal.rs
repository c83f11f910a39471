//! Native buffer marshalling.
//!
//! Converts the broker's option arrays, text buffers and payload buffers
//! into owned Rust values. Broker pointers are only valid for the duration
//! of the call that supplied them, so nothing here retains a reference
//! past return.

use std::ffi::CStr;

use indexmap::IndexMap;
use libc::{c_char, c_int};
use mosqbridge_plugin_abi::PluginOpt;

use crate::error::BridgeError;

/// Ordered option mapping decoded from a broker option array.
///
/// Insertion order is preserved; a duplicate key keeps its first position
/// and takes the last value.
pub type OptionMap = IndexMap<String, String>;

/// Decode a native option array into an [`OptionMap`].
///
/// `count == 0` yields an empty map. A malformed entry (null key, invalid
/// UTF-8) fails the whole call; partial configuration is never returned.
/// A null value decodes as the empty string, since the broker permits
/// value-less options.
///
/// # Safety
///
/// `opts` must be null (valid only with `count == 0`) or point to `count`
/// `PluginOpt` entries whose non-null pointers are valid NUL-terminated
/// strings for the duration of the call.
pub unsafe fn decode_options(
    opts: *const PluginOpt,
    count: c_int,
) -> Result<OptionMap, BridgeError> {
    if count < 0 {
        return Err(BridgeError::Marshal(format!(
            "negative option count {count}"
        )));
    }
    let count = count as usize;
    if count == 0 {
        return Ok(OptionMap::new());
    }
    if opts.is_null() {
        return Err(BridgeError::Marshal(format!(
            "null option array with count {count}"
        )));
    }

    let entries = unsafe { std::slice::from_raw_parts(opts, count) };
    let mut map = OptionMap::with_capacity(count);
    for (idx, opt) in entries.iter().enumerate() {
        if opt.key.is_null() {
            return Err(BridgeError::Marshal(format!("option {idx} has a null key")));
        }
        let key = unsafe { decode_text(opt.key, "option key") }
            .map_err(|err| BridgeError::Marshal(format!("option {idx} key: {err}")))?;
        let value = if opt.value.is_null() {
            String::new()
        } else {
            unsafe { decode_text(opt.value, "option value") }
                .map_err(|err| BridgeError::Marshal(format!("option {idx} `{key}`: {err}")))?
        };
        map.insert(key, value);
    }
    Ok(map)
}

/// Decode a mandatory NUL-terminated text buffer into an owned string.
///
/// Null yields [`BridgeError::NullBuffer`]; callers with a legal-null
/// argument must check before calling. Invalid UTF-8 yields
/// [`BridgeError::Marshal`].
///
/// # Safety
///
/// A non-null `ptr` must point to a valid NUL-terminated string that stays
/// alive for the duration of the call.
pub unsafe fn decode_text(ptr: *const c_char, what: &'static str) -> Result<String, BridgeError> {
    if ptr.is_null() {
        return Err(BridgeError::NullBuffer(what));
    }
    let text = unsafe { CStr::from_ptr(ptr) };
    text.to_str()
        .map(str::to_owned)
        .map_err(|err| BridgeError::Marshal(format!("{what} is not valid UTF-8: {err}")))
}

/// Decode an optional payload buffer into owned bytes.
///
/// A null pointer decodes to `None` (no payload supplied); a non-null
/// pointer with zero length decodes to a present, empty vector. Handlers
/// rely on that distinction and it must never collapse.
///
/// # Safety
///
/// A non-null `ptr` must point to `len` readable bytes that stay alive for
/// the duration of the call.
pub unsafe fn decode_bytes(ptr: *const u8, len: u32) -> Option<Vec<u8>> {
    if ptr.is_null() {
        return None;
    }
    if len == 0 {
        return Some(Vec::new());
    }
    Some(unsafe { std::slice::from_raw_parts(ptr, len as usize) }.to_vec())
}
