//! Cache Module
//!
//! Persistent memoization: key derivation from call arguments, the cache
//! engine, and access-time statistics.

mod args;
mod entry;
mod key;
mod repr;
mod stats;
mod store;


// Re-export public types
pub use args::{Args, CacheArgs};
pub use entry::{now_timestamp, timestamp_to_datetime, StoredKey};
pub use key::{derive_for, derive_key, CacheKey, ATIME_SUFFIX};
pub use repr::{default_repr, Repr, ReprFn};
pub use stats::CacheStats;
pub use store::{Cache, CacheOptions, Memoized};
