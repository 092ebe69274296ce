//! Engine warnings routed through the `log` facade.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the style resolver and the layout engine to report declarations
//! that were skipped and features that are not supported.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Report a warning once per unique `(component, message)` pair.
///
/// The component becomes the `log` target, so `RUST_LOG=style=off` silences
/// one subsystem without touching the others.
///
/// Returns `true` when the warning was emitted and `false` when it had
/// already been reported.
///
/// # Example
/// ```
/// use folio_common::warning::{clear_warnings, warn_once};
///
/// clear_warnings();
/// assert!(warn_once("style", "invalid value 'solidd' for border-style"));
/// assert!(!warn_once("style", "invalid value 'solidd' for border-style"));
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let first_time = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first_time {
        log::warn!(target: component, "{message}");
    }
    first_time
}

/// Number of distinct warnings recorded since the last [`clear_warnings`].
#[must_use]
pub fn warning_count() -> usize {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map_or(0, HashSet::len)
}

/// Clear all recorded warnings (call when starting a new document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}
