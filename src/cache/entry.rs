//! Cache Entry Module
//!
//! Storage layout of memoized entries. Each entry lives under its hex
//! [`CacheKey`] and has an access-time record under `<key>:atime` holding a
//! floating-point Unix timestamp.

use chrono::{DateTime, Utc};

use crate::cache::key::{CacheKey, ATIME_SUFFIX};

// == Stored Key ==
/// Classification of a raw backend key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredKey {
    /// Key holding a memoized result
    Entry(CacheKey),
    /// Key holding the access time of the given entry
    AccessTime(CacheKey),
}

impl StoredKey {
    /// Classifies a raw backend key.
    ///
    /// Only well-formed keys are recognised: a 64-character hex digest,
    /// optionally followed by `:atime`. Anything else (for example keys
    /// written by other users of a shared backend) yields None.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.strip_suffix(ATIME_SUFFIX) {
            Some(digest) => CacheKey::from_hex(digest).map(StoredKey::AccessTime),
            None => CacheKey::from_hex(raw).map(StoredKey::Entry),
        }
    }

    /// The entry this key belongs to.
    pub fn cache_key(&self) -> &CacheKey {
        match self {
            StoredKey::Entry(key) | StoredKey::AccessTime(key) => key,
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in seconds with microsecond precision.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Converts a Unix timestamp in seconds to a UTC datetime.
pub fn timestamp_to_datetime(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
}
