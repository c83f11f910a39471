//! Plugin interface version negotiation.

use libc::c_int;

use crate::constants::PLUGIN_VERSION;

/// Pick the plugin interface version from the list the broker offers.
///
/// Returns [`PLUGIN_VERSION`] if the broker supports it, `None` otherwise.
/// A `None` is reported to the broker as `-1` at the ABI boundary, which
/// aborts the plugin load.
///
/// # Example
///
/// ```
/// use mosqbridge_plugin_abi::{PLUGIN_VERSION, negotiate_version};
///
/// assert_eq!(negotiate_version(&[2, 4, 5]), Some(PLUGIN_VERSION));
/// assert_eq!(negotiate_version(&[2, 3]), None);
/// ```
#[must_use]
pub fn negotiate_version(supported: &[c_int]) -> Option<c_int> {
    supported.iter().copied().find(|&v| v == PLUGIN_VERSION)
}
