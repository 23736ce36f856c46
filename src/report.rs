//! Stats Report Module
//!
//! Human-readable and JSON summaries of a cache's access-time statistics,
//! as printed by the `memo-stats` binary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{timestamp_to_datetime, CacheStats};

/// Read-only summary of one cache file.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Cache file the report was taken from
    pub path: String,
    /// Number of memoized results
    pub entries: usize,
    /// Least recent access, None for an empty cache
    pub oldest_access: Option<DateTime<Utc>>,
    /// Most recent access, None for an empty cache
    pub newest_access: Option<DateTime<Utc>>,
    /// Seconds since the least recent access
    pub oldest_age_secs: Option<f64>,
    /// Seconds since the most recent access
    pub newest_age_secs: Option<f64>,
}

impl StatsReport {
    /// Builds a report from `stats` as seen at time `now` (Unix seconds).
    ///
    /// Timestamps of an empty cache are placeholders, so they are omitted.
    pub fn new(path: impl Into<String>, stats: &CacheStats, now: f64) -> Self {
        let populated = stats.entries > 0;
        Self {
            path: path.into(),
            entries: stats.entries,
            oldest_access: populated
                .then(|| timestamp_to_datetime(stats.oldest_access))
                .flatten(),
            newest_access: populated
                .then(|| timestamp_to_datetime(stats.newest_access))
                .flatten(),
            oldest_age_secs: populated.then(|| stats.oldest_age(now)),
            newest_age_secs: populated.then(|| stats.newest_age(now)),
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let age = |secs: Option<f64>| secs.map(format_age).unwrap_or_else(|| "-".to_string());
        writeln!(f, "Number of cached results : {}", self.entries)?;
        writeln!(f, "Oldest result usage age  : {}", age(self.oldest_age_secs))?;
        writeln!(f, "Latest result usage age  : {}", age(self.newest_age_secs))
    }
}

/// Formats an age in the largest of days, hours or minutes whose count
/// exceeds one, falling back to seconds.
pub fn format_age(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    let units = [(secs / 86_400, "d"), (secs / 3_600, "h"), (secs / 60, "m")];
    for (value, unit) in units {
        if value > 1 {
            return format!("{}{}", value, unit);
        }
    }
    format!("{}s", secs)
}
