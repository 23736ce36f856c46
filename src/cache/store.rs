//! Cache Store Module
//!
//! Main cache engine: lookup-or-compute over a [`Backend`], access-time
//! tracking, age-based clearing and statistics.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{Backend, FileBackend};
use crate::cache::args::CacheArgs;
use crate::cache::entry::{now_timestamp, StoredKey};
use crate::cache::key::{derive_for, CacheKey};
use crate::cache::repr::{default_repr, Repr, ReprFn};
use crate::cache::stats::CacheStats;
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Options ==
/// Construction options for [`Cache`].
#[derive(Clone)]
pub struct CacheOptions {
    /// Representation function applied to every argument
    pub repr: ReprFn,
    /// Flush the backend after every write instead of on close
    pub live_sync: bool,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the representation function.
    ///
    /// The function sees each argument only as `&dyn Repr`, so it can
    /// post-process or ignore `value.repr()` but cannot tell argument types
    /// apart. Per-type representations belong in [`Repr`] impls.
    pub fn with_repr<F>(mut self, repr: F) -> Self
    where
        F: Fn(&dyn Repr) -> String + Send + Sync + 'static,
    {
        self.repr = Arc::new(repr);
        self
    }

    pub fn live_sync(mut self, enabled: bool) -> Self {
        self.live_sync = enabled;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            repr: Arc::new(default_repr),
            live_sync: false,
        }
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("live_sync", &self.live_sync)
            .finish_non_exhaustive()
    }
}

// == Cache ==
/// Persistent memoization cache.
///
/// The cache is OPEN until [`Cache::close`] is called or it is dropped; after
/// that every operation except `close` fails with `CacheError::Closed`.
///
/// The backend lock is not held while a wrapped callable runs, so concurrent
/// callers with the same arguments may both compute; the last write wins.
pub struct Cache<B: Backend> {
    /// Backend (None once closed) and session counters
    state: Mutex<State<B>>,
    repr: ReprFn,
    live_sync: bool,
}

struct State<B> {
    backend: Option<B>,
    stats: CacheStats,
}

/// The backend if the cache is still open.
fn open_backend<B>(slot: &mut Option<B>) -> Result<&mut B> {
    slot.as_mut().ok_or(CacheError::Closed)
}

impl Cache<FileBackend> {
    // == Open ==
    /// Opens (or creates) a file-backed cache at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, CacheOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: CacheOptions) -> Result<Self> {
        let backend = FileBackend::open(path)?;
        Ok(Self::with_options(backend, options))
    }

    /// Opens the file-backed cache described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open_with_options(
            &config.cache_path,
            CacheOptions::default().live_sync(config.live_sync),
        )
    }
}

impl<B: Backend> Cache<B> {
    // == Constructor ==
    /// Creates a cache over an injected backend with default options.
    pub fn with_backend(backend: B) -> Self {
        Self::with_options(backend, CacheOptions::default())
    }

    pub fn with_options(backend: B, options: CacheOptions) -> Self {
        Self {
            state: Mutex::new(State {
                backend: Some(backend),
                stats: CacheStats::new(),
            }),
            repr: options.repr,
            live_sync: options.live_sync,
        }
    }

    // == Wrap ==
    /// Memoizes an infallible callable under `name`.
    ///
    /// `name` is part of every key, so it must be stable across runs and
    /// unique per callable sharing this cache.
    pub fn wrap<A, R, F>(
        &self,
        name: impl Into<String>,
        func: F,
    ) -> Memoized<'_, B, impl Fn(A) -> Result<R>>
    where
        A: CacheArgs,
        F: Fn(A) -> R,
    {
        Memoized {
            cache: self,
            name: name.into(),
            func: move |args: A| -> Result<R> { Ok(func(args)) },
        }
    }

    /// Memoizes a fallible callable under `name`.
    ///
    /// Errors returned by `func` reach the caller unchanged and are never
    /// cached. Cache failures are converted into `E`.
    pub fn wrap_fallible<A, R, E, F>(&self, name: impl Into<String>, func: F) -> Memoized<'_, B, F>
    where
        A: CacheArgs,
        F: Fn(A) -> std::result::Result<R, E>,
        E: From<CacheError>,
    {
        Memoized {
            cache: self,
            name: name.into(),
            func,
        }
    }

    /// Derives the key for `args` passed to the callable `name`.
    pub fn key_for<A: CacheArgs + ?Sized>(&self, name: &str, args: &A) -> CacheKey {
        derive_for(name, args, &*self.repr)
    }

    // == Lookup ==
    /// Returns the stored result for `key` and refreshes its access time.
    fn lookup<R: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<R>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let backend = open_backend(&mut state.backend)?;

        match backend.get(key.as_str())? {
            Some(value) => {
                let result = serde_json::from_value(value)?;
                Self::touch(backend, key, self.live_sync)?;
                state.stats.record_hit();
                Ok(Some(result))
            }
            None => {
                state.stats.record_miss();
                Ok(None)
            }
        }
    }

    // == Store ==
    /// Stores a freshly computed result and its access time.
    fn store<R: Serialize>(&self, key: &CacheKey, result: &R) -> Result<()> {
        let value = serde_json::to_value(result)?;
        let mut guard = self.state.lock();
        let backend = open_backend(&mut guard.backend)?;

        backend.set(key.as_str(), value)?;
        Self::touch(backend, key, self.live_sync)
    }

    fn touch(backend: &mut B, key: &CacheKey, live_sync: bool) -> Result<()> {
        backend.set(&key.atime_key(), Value::from(now_timestamp()))?;
        if live_sync {
            backend.sync()?;
        }
        Ok(())
    }

    /// Removes one entry and its access time. Returns true if it existed.
    pub fn forget(&self, key: &CacheKey) -> Result<bool> {
        let mut guard = self.state.lock();
        let backend = open_backend(&mut guard.backend)?;

        let existed = backend.delete(key.as_str())?;
        backend.delete(&key.atime_key())?;
        if self.live_sync {
            backend.sync()?;
        }
        Ok(existed)
    }

    // == Clear ==
    /// Clears cached results.
    ///
    /// With `max_age` = None every key in the backend is removed. Otherwise
    /// only entries whose last access is older than `now - max_age` are
    /// removed, together with their access-time records.
    ///
    /// Returns the number of entries removed.
    pub fn clear(&self, max_age: Option<Duration>) -> Result<usize> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let backend = open_backend(&mut state.backend)?;

        let removed = match max_age {
            None => {
                let count = access_times(backend)?.len();
                backend.clear()?;
                info!("Cleared cache ({} entries)", count);
                count
            }
            Some(max_age) => {
                let cutoff = now_timestamp() - max_age.as_secs_f64();
                let outdated: Vec<CacheKey> = access_times(backend)?
                    .into_iter()
                    .filter(|(_, atime)| *atime < cutoff)
                    .map(|(key, _)| key)
                    .collect();

                for key in &outdated {
                    backend.delete(&key.atime_key())?;
                    backend.delete(key.as_str())?;
                }
                state.stats.record_evictions(outdated.len());
                info!(
                    "Cleared {} entries unused for more than {:?}",
                    outdated.len(),
                    max_age
                );
                outdated.len()
            }
        };

        if self.live_sync && removed > 0 {
            backend.sync()?;
        }
        Ok(removed)
    }

    // == Stats ==
    /// Returns the access-time summary and this instance's counters.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let backend = open_backend(&mut state.backend)?;

        let mut stats = CacheStats {
            entries: 0,
            oldest_access: now_timestamp(),
            newest_access: 0.0,
            ..state.stats.clone()
        };
        for (_, atime) in access_times(backend)? {
            stats.observe_access(atime);
        }
        Ok(stats)
    }

    // == Length ==
    /// Returns the number of memoized results.
    pub fn len(&self) -> Result<usize> {
        let mut guard = self.state.lock();
        let backend = open_backend(&mut guard.backend)?;
        Ok(access_times(backend)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flushes buffered writes to the backend.
    pub fn sync(&self) -> Result<()> {
        let mut guard = self.state.lock();
        open_backend(&mut guard.backend)?.sync()
    }

    // == Close ==
    /// Flushes and closes the backend. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let backend = self.state.lock().backend.take();
        match backend {
            Some(mut backend) => {
                backend.close()?;
                info!("Cache closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().backend.is_none()
    }
}

impl<B: Backend> Drop for Cache<B> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close cache on drop: {}", e);
        }
    }
}

impl<B: Backend> fmt::Debug for Cache<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("live_sync", &self.live_sync)
            .field(
                "closed",
                &self.state.try_lock().map(|state| state.backend.is_none()),
            )
            .finish_non_exhaustive()
    }
}

/// Collects every well-formed access-time record as (entry key, timestamp).
fn access_times<B: Backend>(backend: &B) -> Result<Vec<(CacheKey, f64)>> {
    let mut records = Vec::new();
    for raw in backend.keys()? {
        if let Some(StoredKey::AccessTime(key)) = StoredKey::parse(&raw) {
            if let Some(value) = backend.get(&raw)? {
                let atime: f64 = serde_json::from_value(value)?;
                records.push((key, atime));
            }
        }
    }
    Ok(records)
}

// == Memoized ==
/// A callable wrapped by [`Cache::wrap`] or [`Cache::wrap_fallible`].
pub struct Memoized<'c, B: Backend, F> {
    cache: &'c Cache<B>,
    name: String,
    func: F,
}

impl<'c, B: Backend, F> Memoized<'c, B, F> {
    /// Name the callable is cached under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key under which the result for `args` is stored.
    pub fn key<A: CacheArgs + ?Sized>(&self, args: &A) -> CacheKey {
        self.cache.key_for(&self.name, args)
    }

    // == Call ==
    /// Returns the cached result for `args`, computing and storing it on a miss.
    ///
    /// The access time is refreshed on hits and misses. An error from the
    /// wrapped callable is returned as is and nothing is stored.
    pub fn call<A, R, E>(&self, args: A) -> std::result::Result<R, E>
    where
        A: CacheArgs,
        F: Fn(A) -> std::result::Result<R, E>,
        R: Serialize + DeserializeOwned,
        E: From<CacheError>,
    {
        let key = self.key(&args);

        if let Some(result) = self.cache.lookup(&key)? {
            debug!("Cache hit for {} ({})", self.name, key);
            return Ok(result);
        }

        debug!("Cache miss for {} ({}), computing", self.name, key);
        let result = (self.func)(args)?;
        self.cache.store(&key, &result)?;
        Ok(result)
    }

    /// Drops the cached result for `args`. Returns true if one existed.
    pub fn forget<A: CacheArgs + ?Sized>(&self, args: &A) -> Result<bool> {
        self.cache.forget(&self.key(args))
    }
}

impl<'c, B: Backend, F> fmt::Debug for Memoized<'c, B, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::cache::args::Args;
    use serde_json::json;
    use std::cell::Cell;
    use std::thread::sleep;

    fn memory_cache() -> Cache<MemoryBackend> {
        Cache::with_backend(MemoryBackend::new())
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = memory_cache();
        let runs = Cell::new(0);
        let f = cache.wrap("f", |(a, _b): (i32, i32)| {
            runs.set(runs.get() + 1);
            a
        });

        assert_eq!(f.call((1, 2)).unwrap(), 1);
        assert_eq!(runs.get(), 1);

        assert_eq!(f.call((1, 2)).unwrap(), 1);
        assert_eq!(runs.get(), 1, "second call must be a hit");

        assert_eq!(f.call((1, 3)).unwrap(), 1);
        assert_eq!(runs.get(), 2, "different arguments must compute");

        let stats = cache.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn test_same_args_different_callables() {
        let cache = memory_cache();
        let runs = Cell::new(0);
        let f1 = cache.wrap("f1", |(a, _b): (i32, i32)| {
            runs.set(runs.get() + 1);
            a
        });
        let f2 = cache.wrap("f2", |(a, _b): (i32, i32)| {
            runs.set(runs.get() + 1);
            a
        });

        f1.call((1, 3)).unwrap();
        f2.call((1, 3)).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_keyword_arguments_order() {
        let cache = memory_cache();
        let runs = Cell::new(0);
        let f = cache.wrap("f6", |_args: Args| {
            runs.set(runs.get() + 1);
            4
        });

        f.call(Args::new().arg(1).kwarg("z", 1).kwarg("y", 1)).unwrap();
        f.call(Args::new().arg(1).kwarg("y", 1).kwarg("z", 1)).unwrap();
        assert_eq!(runs.get(), 1);

        f.call(Args::new().arg(1).kwarg("y", 0).kwarg("z", 2)).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_failure_not_cached() {
        let cache = memory_cache();
        let attempts = Cell::new(0);
        let f = cache.wrap_fallible("flaky", |(n,): (u32,)| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(CacheError::Backend("transient".to_string()))
            } else {
                Ok(n * 2)
            }
        });

        assert!(f.call((4,)).is_err());
        assert_eq!(cache.len().unwrap(), 0);

        assert_eq!(f.call((4,)).unwrap(), 8);
        assert_eq!(attempts.get(), 2);

        assert_eq!(f.call((4,)).unwrap(), 8);
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_atime_written_on_miss() {
        let cache = memory_cache();
        let before = now_timestamp();
        let f = cache.wrap("f", |(a,): (i32,)| a);

        f.call((1,)).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 1);
        assert!(stats.newest_access >= before);
        assert_eq!(stats.oldest_access, stats.newest_access);
    }

    #[test]
    fn test_hit_refreshes_atime() {
        let cache = memory_cache();
        let f = cache.wrap("f", |(a,): (i32,)| a);

        f.call((1,)).unwrap();
        let first = cache.stats().unwrap().newest_access;
        sleep(Duration::from_millis(20));
        f.call((1,)).unwrap();
        let second = cache.stats().unwrap().newest_access;

        assert!(second > first);
    }

    #[test]
    fn test_clear_all() {
        let cache = memory_cache();
        let f = cache.wrap("f", |(a,): (i32,)| a);
        f.call((1,)).unwrap();
        f.call((2,)).unwrap();

        assert_eq!(cache.clear(None).unwrap(), 2);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 0);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_clear_by_age() {
        let cache = memory_cache();
        let runs = Cell::new(0);
        let f = cache.wrap("f5", |(a,): (i32,)| {
            runs.set(runs.get() + 1);
            a
        });

        f.call((1,)).unwrap();
        sleep(Duration::from_millis(1200));
        f.call((2,)).unwrap();

        assert_eq!(cache.clear(Some(Duration::from_secs(1))).unwrap(), 1);
        assert_eq!(cache.stats().unwrap().evictions, 1);

        f.call((1,)).unwrap();
        assert_eq!(runs.get(), 3, "evicted entry must recompute");
        f.call((2,)).unwrap();
        assert_eq!(runs.get(), 3, "fresh entry must still hit");
    }

    #[test]
    fn test_clear_ignores_foreign_keys() {
        let mut backend = MemoryBackend::new();
        backend.set("session:atime", json!(0.0)).unwrap();
        backend.set("session", json!("keep me")).unwrap();

        let cache = Cache::with_backend(backend);
        assert_eq!(cache.clear(Some(Duration::from_secs(1))).unwrap(), 0);
        assert_eq!(cache.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_stats_empty_defaults() {
        let cache = memory_cache();
        let before = now_timestamp();

        let stats = cache.stats().unwrap();

        assert_eq!(stats.entries, 0);
        assert_eq!(stats.newest_access, 0.0);
        assert!(stats.oldest_access >= before);
    }

    #[test]
    fn test_forget() {
        let cache = memory_cache();
        let runs = Cell::new(0);
        let f = cache.wrap("f", |(a,): (i32,)| {
            runs.set(runs.get() + 1);
            a
        });

        f.call((1,)).unwrap();
        assert!(f.forget(&(1,)).unwrap());
        assert!(!f.forget(&(1,)).unwrap());

        f.call((1,)).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_custom_repr() {
        let options = CacheOptions::new().with_repr(|_| "foobar".to_string());
        let cache = Cache::with_options(MemoryBackend::new(), options);
        let runs = Cell::new(0);
        let f = cache.wrap("f8", |_args: (i32,)| {
            runs.set(runs.get() + 1);
            0
        });

        f.call((1,)).unwrap();
        f.call((2,)).unwrap();
        f.call((5,)).unwrap();
        assert_eq!(runs.get(), 1, "constant repr maps every argument to one entry");
    }

    #[test]
    fn test_repr_fn_post_processes_repr() {
        let options = CacheOptions::new().with_repr(|value| value.repr().to_lowercase());
        let cache = Cache::with_options(MemoryBackend::new(), options);
        let runs = Cell::new(0);
        let f = cache.wrap("lookup", |(name,): (String,)| {
            runs.set(runs.get() + 1);
            name.len()
        });

        f.call(("Alice".to_string(),)).unwrap();
        f.call(("ALICE".to_string(),)).unwrap();
        f.call(("bob".to_string(),)).unwrap();
        assert_eq!(runs.get(), 2, "case-folded representations share an entry");
    }

    #[test]
    fn test_live_sync_flushes_every_write() {
        let mut backend = MemoryBackend::new();
        {
            let cache = Cache::with_options(&mut backend, CacheOptions::new().live_sync(true));
            let f = cache.wrap("f", |(a,): (i32,)| a);
            f.call((1,)).unwrap(); // miss
            f.call((1,)).unwrap(); // hit, atime write
        }
        assert_eq!(backend.sync_count(), 2);
    }

    #[test]
    fn test_no_sync_without_live_sync() {
        let mut backend = MemoryBackend::new();
        {
            let cache = Cache::with_backend(&mut backend);
            let f = cache.wrap("f", |(a,): (i32,)| a);
            f.call((1,)).unwrap();
            f.call((1,)).unwrap();
        }
        assert_eq!(backend.sync_count(), 0);
        assert!(backend.is_closed());
    }

    #[test]
    fn test_closed_state() {
        let cache = memory_cache();
        let f = cache.wrap("f", |(a,): (i32,)| a);

        cache.close().unwrap();
        assert!(cache.is_closed());
        assert!(cache.close().is_ok());

        assert!(matches!(f.call((1,)), Err(CacheError::Closed)));
        assert!(matches!(cache.clear(None), Err(CacheError::Closed)));
        assert!(matches!(cache.stats(), Err(CacheError::Closed)));
        assert!(matches!(cache.len(), Err(CacheError::Closed)));
    }

    #[test]
    fn test_codec_error_on_type_change() {
        let cache = memory_cache();
        let as_text = cache.wrap("g", |(_n,): (i32,)| "text".to_string());
        as_text.call((1,)).unwrap();

        let as_number = cache.wrap("g", |(n,): (i32,)| n);
        assert!(matches!(as_number.call((1,)), Err(CacheError::Codec(_))));
    }

    #[test]
    fn test_recursive_memoization() {
        let cache = memory_cache();
        fn fib(cache: &Cache<MemoryBackend>, n: u64) -> u64 {
            let f = cache.wrap("fib", |(n,): (u64,)| {
                if n < 2 {
                    n
                } else {
                    fib(cache, n - 1) + fib(cache, n - 2)
                }
            });
            f.call((n,)).unwrap()
        }

        assert_eq!(fib(&cache, 30), 832_040);
        assert_eq!(cache.len().unwrap(), 31);
    }
}
