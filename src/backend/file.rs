//! File Backend Module
//!
//! Default persistent backend: the whole mapping is kept in memory and written
//! to a single JSON document on `sync`/`close`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{CacheError, Result};

// == File Backend ==
/// JSON-document backend opened from a filesystem path.
///
/// Writes are buffered until `sync` or `close`. Snapshots are written to a
/// sibling temporary file and renamed over the target, so a crash mid-write
/// leaves the previous snapshot intact.
#[derive(Debug)]
pub struct FileBackend {
    /// Location of the JSON document
    path: PathBuf,
    /// Current contents, ordered so snapshots are stable
    entries: BTreeMap<String, Value>,
    /// True when `entries` differs from the last snapshot
    dirty: bool,
    closed: bool,
}

impl FileBackend {
    // == Open ==
    /// Opens the store at `path`, creating an empty one if the file is missing.
    ///
    /// Fails with `CacheError::Backend` if the file cannot be read or does not
    /// hold a JSON object.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let (entries, dirty) = if path.exists() {
            (Self::load(&path)?, false)
        } else {
            (BTreeMap::new(), true)
        };

        let mut backend = Self {
            path,
            entries,
            dirty,
            closed: false,
        };
        // Create the file right away so an unwritable location fails at open time
        backend.persist()?;

        info!(
            "Opened file backend at {} ({} keys)",
            backend.path.display(),
            backend.entries.len()
        );
        Ok(backend)
    }

    /// Path of the backing JSON document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, Value>> {
        let raw = fs::read_to_string(path)
            .map_err(|e| CacheError::backend(format!("failed to read {}", path.display()), e))?;

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw)
            .map_err(|e| CacheError::backend(format!("corrupt cache file {}", path.display()), e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes the snapshot if anything changed since the last one.
    fn persist(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let json = serde_json::to_string(&self.entries)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json.as_bytes())
            .map_err(|e| CacheError::backend(format!("failed to write {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            CacheError::backend(format!("failed to replace {}", self.path.display()), e)
        })?;

        self.dirty = false;
        debug!("Wrote {} keys to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Backend for FileBackend {
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
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let removed = self.entries.remove(key).is_some();
        self.dirty |= removed;
        Ok(removed)
    }

    fn keys(&self) -> Result<Box<dyn Iterator<Item = String> + '_>> {
        self.ensure_open()?;
        Ok(Box::new(self.entries.keys().cloned()))
    }

    fn clear(&mut self) -> Result<()> {
        self.ensure_open()?;
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.persist()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.persist()?;
        self.closed = true;
        self.entries.clear();
        debug!("Closed file backend at {}", self.path.display());
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to flush {} on drop: {}", self.path.display(), e);
        }
    }
}
