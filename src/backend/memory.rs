//! In-memory backend.

use std::collections::HashMap;

use serde_json::Value;

use crate::backend::Backend;
use crate::error::{CacheError, Result};

// == Memory Backend ==
/// Process-local backend. Nothing survives the process; `sync` only counts.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Value>,
    sync_count: usize,
    closed: bool,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `sync` has been called.
    pub fn sync_count(&self) -> usize {
        self.sync_count
    }

    /// Number of stored keys, including access-time records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Backend for MemoryBackend {
    fn contains(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.entries.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.ensure_open()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.ensure_open()?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        self.ensure_open()?;
        Ok(Box::new(self.entries.keys().cloned()))
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.entries.clear();
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.sync_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
