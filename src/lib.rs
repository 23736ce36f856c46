//! Persistent Memo - durable memoization for deterministic callables
//!
//! Wraps a callable so its results are stored in a key-value backend and
//! returned on later calls with the same arguments, across process restarts.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod report;
pub mod tasks;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use cache::{Args, Cache, CacheArgs, CacheOptions, CacheStats, Memoized, Repr};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{spawn_sweep_from_config, spawn_sweep_task};
