//! Property tests for native buffer marshalling.

use std::ffi::CString;

use libc::{c_char, c_int};
use mosqbridge_bridge::marshal::{OptionMap, decode_bytes, decode_options};
use mosqbridge_plugin_abi::PluginOpt;
use proptest::prelude::*;

fn option_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec(("[a-z]{1,8}", "[ -~]{0,12}"), 0..12)
}

proptest! {
    /// Decoding preserves the pair set under last-write-wins, and keeps
    /// first-insertion order.
    #[test]
    fn options_decode_matches_last_write_wins(pairs in option_pairs()) {
        let keys: Vec<CString> = pairs
            .iter()
            .map(|(k, _)| CString::new(k.as_str()).unwrap_or_default())
            .collect();
        let values: Vec<CString> = pairs
            .iter()
            .map(|(_, v)| CString::new(v.as_str()).unwrap_or_default())
            .collect();
        let opts: Vec<PluginOpt> = keys
            .iter()
            .zip(&values)
            .map(|(k, v)| PluginOpt {
                key: k.as_ptr() as *mut c_char,
                value: v.as_ptr() as *mut c_char,
            })
            .collect();

        let decoded = unsafe { decode_options(opts.as_ptr(), opts.len() as c_int) };
        let decoded = match decoded {
            Ok(map) => map,
            Err(err) => return Err(TestCaseError::fail(format!("decode failed: {err}"))),
        };

        let mut expected = OptionMap::new();
        for (k, v) in &pairs {
            expected.insert(k.clone(), v.clone());
        }
        // Same keys in the same first-insertion order, same winning values.
        let decoded_keys: Vec<&String> = decoded.keys().collect();
        let expected_keys: Vec<&String> = expected.keys().collect();
        prop_assert_eq!(decoded_keys, expected_keys);
        prop_assert_eq!(decoded, expected);
    }

    /// Zero count never faults, whatever the pointer.
    #[test]
    fn zero_count_is_always_empty(_any in any::<u8>()) {
        let map = unsafe { decode_options(std::ptr::null(), 0) };
        prop_assert!(matches!(map, Ok(m) if m.is_empty()));
    }

    /// A null payload is absent for any length; a present payload round-trips.
    #[test]
    fn payload_null_vs_present(bytes in proptest::collection::vec(any::<u8>(), 0..64), len in any::<u32>()) {
        prop_assert_eq!(unsafe { decode_bytes(std::ptr::null(), len) }, None);

        let decoded = unsafe { decode_bytes(bytes.as_ptr(), bytes.len() as u32) };
        prop_assert_eq!(decoded, Some(bytes));
    }
}
