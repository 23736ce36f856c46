//! Age Sweep Task
//!
//! Background task that periodically removes cache entries that have not been
//! used for a configured age.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::cache::Cache;
use crate::config::Config;
use crate::error::CacheError;

/// Shortest interval between sweeps; shorter requests are raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns a background task that calls `clear(Some(max_age))` every `interval`.
///
/// The task stops on its own once the cache is closed. Otherwise abort it via
/// the returned handle. `interval` is raised to [`MIN_SWEEP_INTERVAL`].
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::open("results.json")?);
/// let sweep = spawn_sweep_task(cache.clone(), Duration::from_secs(86_400), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_sweep_task<B>(
    cache: Arc<Cache<B>>,
    max_age: Duration,
    interval: Duration,
) -> JoinHandle<()>
where
    B: Backend + Send + 'static,
{
    let interval = effective_interval(interval);

    tokio::spawn(async move {
        info!(
            "Starting sweep task: max_age={:?}, interval={:?}",
            max_age, interval
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.clear(Some(max_age)) {
                Ok(removed) if removed > 0 => {
                    info!("Sweep: removed {} stale entries", removed);
                }
                Ok(_) => {
                    debug!("Sweep: no stale entries found");
                }
                Err(CacheError::Closed) => {
                    info!("Cache closed, stopping sweep task");
                    break;
                }
                Err(e) => {
                    warn!("Sweep failed: {}", e);
                }
            }
        }
    })
}

fn effective_interval(requested: Duration) -> Duration {
    if requested < MIN_SWEEP_INTERVAL {
        warn!(
            "Sweep interval {:?} too short, using {:?}",
            requested, MIN_SWEEP_INTERVAL
        );
        return MIN_SWEEP_INTERVAL;
    }
    requested
}

/// Spawns the sweep task described by `config`.
///
/// Returns None when `config.max_age` is unset, since nothing would ever be
/// swept.
pub fn spawn_sweep_from_config<B>(cache: Arc<Cache<B>>, config: &Config) -> Option<JoinHandle<()>>
where
    B: Backend + Send + 'static,
{
    let max_age = config.max_age()?;
    Some(spawn_sweep_task(cache, max_age, config.sweep_interval()))
}
