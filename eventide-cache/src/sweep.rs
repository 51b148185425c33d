//! Periodic expiry sweep.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::manager::Shared;

/// Background task that deletes expired entries on a fixed interval.
///
/// Entries with a refresh in flight are left alone so a stale value a
/// reader already saw is not erased right before its replacement lands.
/// The task holds only a weak reference to the cache and ends on its own
/// once the cache is gone; it is also aborted when this handle drops.
#[derive(Debug)]
pub struct SweepTask {
    handle: JoinHandle<()>,
    interval: Duration,
}

impl SweepTask {
    pub(crate) fn start(runtime: &Handle, shared: Weak<Shared>, interval: Duration) -> Self {
        info!(interval_ms = interval.as_millis() as u64, "cache sweep started");

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    debug!("cache dropped, sweep exiting");
                    break;
                };
                let removed = shared.purge_expired();
                if removed > 0 {
                    debug!(removed, "swept expired entries");
                }
            }
        });

        Self { handle, interval }
    }

    /// Time between two sweeps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true while the task is scheduled.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the task. Idempotent.
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            info!("cache sweep stopped");
        }
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::time::sleep;

    use eventide_core::CacheConfig;

    use crate::manager::CacheManager;

    use super::*;

    const TTL: Duration = Duration::from_millis(100);

    async fn fetch_after(delay: Duration, value: u32, calls: Arc<AtomicUsize>) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        sleep(delay).await;
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_entries() {
        let cache = CacheManager::new(
            CacheConfig::default()
                .with_rule("tags", TTL, false)
                .with_sweep_interval(Duration::from_millis(50)),
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        cache.get_or_fetch("tags", move || fetch_after(Duration::ZERO, 1, c)).await.unwrap();
        assert!(cache.contains("tags"));

        sleep(Duration::from_millis(60)).await;
        assert!(cache.contains("tags"));

        sleep(Duration::from_millis(100)).await;
        assert!(!cache.contains("tags"));
        assert_eq!(cache.stats().swept, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_respects_in_flight_revalidation() {
        let cache = CacheManager::new(
            CacheConfig::default()
                .with_rule("x", TTL, true)
                .with_sweep_interval(Duration::from_millis(1000)),
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        cache.get_or_fetch("x:1", move || fetch_after(Duration::ZERO, 1, c)).await.unwrap();
        sleep(Duration::from_millis(150)).await;

        // Refresh lands at ~2150ms; sweeps at 1000ms and 2000ms see it in flight.
        let c = calls.clone();
        let stale = cache
            .get_or_fetch("x:1", move || fetch_after(Duration::from_millis(2000), 2, c))
            .await
            .unwrap();
        assert_eq!(*stale, 1);

        sleep(Duration::from_millis(900)).await;
        assert!(cache.contains("x:1"));
        assert!(cache.is_revalidating("x:1"));

        sleep(Duration::from_millis(1150)).await;
        assert!(!cache.is_revalidating("x:1"));

        let c = calls.clone();
        let fresh = cache.get_or_fetch("x:1", move || fetch_after(Duration::ZERO, 3, c)).await.unwrap();
        assert_eq!(*fresh, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().swept, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_sweep() {
        let cache = CacheManager::new(
            CacheConfig::default()
                .with_rule("tags", TTL, false)
                .with_sweep_interval(Duration::from_millis(50)),
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        assert!(cache.sweep_task().is_running());
        cache.shutdown();
        cache.shutdown();

        let c = calls.clone();
        cache.get_or_fetch("tags", move || fetch_after(Duration::ZERO, 1, c)).await.unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(!cache.sweep_task().is_running());
        assert!(cache.contains("tags"));
        assert_eq!(cache.purge_expired(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_ends_once_cache_is_gone() {
        let task = SweepTask::start(&Handle::current(), Weak::new(), Duration::from_millis(10));
        assert!(task.is_running());
        assert_eq!(task.interval(), Duration::from_millis(10));

        sleep(Duration::from_millis(20)).await;
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop() {
        let task = SweepTask::start(&Handle::current(), Weak::new(), Duration::from_secs(3600));
        task.stop();
        sleep(Duration::from_millis(1)).await;
        assert!(!task.is_running());
        task.stop();
    }
}
