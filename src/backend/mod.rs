//! Backend Module
//!
//! Storage abstraction underneath the memoization cache. A backend is a flat
//! mapping from string keys to JSON values plus two lifecycle operations:
//! `sync` (flush without closing) and `close` (flush and release).
//!
//! # Implementations
//! - [`FileBackend`] - JSON document on disk, opened from a path
//! - [`MemoryBackend`] - process-local map, mostly for tests and scratch caches
//!
//! Any other store can be plugged in by implementing [`Backend`]. Borrowed
//! (`&mut B`) and boxed backends implement the trait as well, so a caller can
//! keep ownership of an injected backend.

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use serde_json::Value;

use crate::error::Result;

// == Backend Trait ==
/// Persistent or in-memory key-value store used by the cache engine.
///
/// Every operation except `close` fails with `CacheError::Closed` once the
/// backend has been closed. `close` itself must be idempotent.
pub trait Backend {
    /// Returns true if `key` is present.
    fn contains(&self, key: &str) -> Result<bool>;

    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Returns true if it was present.
    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Iterates over all stored keys.
    ///
    /// The iterator is finite; calling `keys` again restarts the scan.
    fn keys(&self) -> Result<Box<dyn Iterator<Item = String> + '_>>;

    /// Removes every key.
    fn clear(&mut self) -> Result<()> {
        let keys: Vec<String> = self.keys()?.collect();
        for key in keys {
            self.delete(&key)?;
        }
        Ok(())
    }

    /// Flushes buffered writes to durable storage without closing.
    fn sync(&mut self) -> Result<()>;

    /// Flushes and releases the backend.
    fn close(&mut self) -> Result<()>;

    /// Returns true once `close` has been called.
    fn is_closed(&self) -> bool;
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn contains(&self, key: &str) -> Result<bool> {
        (**self).contains(key)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        (**self).keys()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn contains(&self, key: &str) -> Result<bool> {
        (**self).contains(key)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn keys(&self) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        (**self).keys()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
