//! Strong identifiers for A2A entities — deliberately a different type
//! (stringified UUID v4) from the frame-level 64-bit `message_id`, so the
//! two id spaces can never be confused at the type level.

use uuid::Uuid;

/// Generate a fresh 128-bit-strong identifier, string-encoded.
pub fn new_strong_id() -> String {
    Uuid::new_v4().to_string()
}
