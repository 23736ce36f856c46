//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the file backend
    pub cache_path: PathBuf,
    /// Flush the backend after every write
    pub live_sync: bool,
    /// Age in seconds after which unused entries are swept, None = never
    pub max_age: Option<u64>,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `MEMO_CACHE_PATH` - Cache file path (default: .memo-cache.json)
    /// - `MEMO_LIVE_SYNC` - Flush after every write (default: false)
    /// - `MEMO_MAX_AGE` - Sweep entries unused for this many seconds (default: unset)
    /// - `MEMO_SWEEP_INTERVAL` - Sweep frequency in seconds, at least 1 (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_path: env::var("MEMO_CACHE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            live_sync: env::var("MEMO_LIVE_SYNC")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.live_sync),
            max_age: env::var("MEMO_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.max_age),
            sweep_interval: env::var("MEMO_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Like [`Config::from_env`], but fails on values that do not parse.
    pub fn try_from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            cache_path: env::var("MEMO_CACHE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            live_sync: match env::var("MEMO_LIVE_SYNC").ok() {
                Some(v) => parse_bool(&v).ok_or_else(|| invalid("MEMO_LIVE_SYNC", &v))?,
                None => defaults.live_sync,
            },
            max_age: match env::var("MEMO_MAX_AGE").ok() {
                Some(v) => Some(parse_var("MEMO_MAX_AGE", &v)?),
                None => defaults.max_age,
            },
            sweep_interval: match env::var("MEMO_SWEEP_INTERVAL").ok() {
                Some(v) => match parse_var("MEMO_SWEEP_INTERVAL", &v)? {
                    0 => return Err(invalid("MEMO_SWEEP_INTERVAL", &v)),
                    secs => secs,
                },
                None => defaults.sweep_interval,
            },
        })
    }

    /// Sweep age as a Duration, if sweeping is enabled.
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(".memo-cache.json"),
            live_sync: false,
            max_age: None,
            sweep_interval: 60,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| invalid(name, raw))
}

fn invalid(name: &str, raw: &str) -> CacheError {
    CacheError::InvalidConfig(format!("{}={:?}", name, raw))
}
