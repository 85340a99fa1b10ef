//! Default settings and naming constants.
//!
//! These mirror the option defaults every context in a page group is expected
//! to agree on. Two contexts only see each other when they use the same slot
//! name and path.

use std::time::Duration;

// =============================================================================
// SLOT DEFAULTS
// =============================================================================

/// Default slot name. Also the name of the aggregate change event.
pub const DEFAULT_SLOT_NAME: &str = "sync";

/// Default storage scoping path.
pub const DEFAULT_PATH: &str = "/";

/// Default lifetime of the persisted entry (days, for the cookie adapter).
pub const DEFAULT_EXPIRES: u32 = 30;

// =============================================================================
// POLLING
// =============================================================================

/// Default delay between the end of one tick and the start of the next.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Default delay in milliseconds, as used by [`SyncOptions`](crate::sync::SyncOptions).
pub const DEFAULT_DELAY_MS: u64 = 100;

// =============================================================================
// EVENTS
// =============================================================================

/// Separator between the slot name and the key in per-key event names.
pub const EVENT_SEPARATOR: char = ':';

/// Characters a slot name may not contain.
///
/// `:` would make per-key event names ambiguous, the rest would break the
/// cookie `name=value; attr` syntax.
pub const RESERVED_NAME_CHARS: &[char] = &[':', ';', '=', ',', ' ', '\t', '\r', '\n'];

// =============================================================================
// COOKIE ADAPTER
// =============================================================================

/// Maximum size of one encoded `name=value` cookie pair.
pub const MAX_COOKIE_SIZE: usize = 4096;

/// Builds the per-key event name `"<slot>:<key>"`.
pub fn key_event_name(slot: &str, key: &str) -> String {
    let mut name = String::with_capacity(slot.len() + key.len() + 1);
    name.push_str(slot);
    name.push(EVENT_SEPARATOR);
    name.push_str(key);
    name
}
