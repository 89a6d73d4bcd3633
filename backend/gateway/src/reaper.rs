//! Session reaper.
//!
//! Drops sessions whose last activity is older than the idle TTL.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use picscribe_core::SessionStore;

/// Spawn the periodic reaping loop. The first sweep runs after one `interval`.
pub fn spawn_session_reaper(
    store: SessionStore,
    idle_ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    let ttl = chrono::Duration::from_std(idle_ttl).unwrap_or(chrono::Duration::MAX);
    info!(
        idle_ttl_secs = idle_ttl.as_secs(),
        interval_secs = interval.as_secs(),
        "Session reaper started"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reaped = store.reap_idle(ttl).await;
            let remaining = store.len().await;
            debug!(reaped, remaining, "Session sweep finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reaps_sessions_past_ttl() {
        let store = SessionStore::new();
        store.create("describe").await;
        assert_eq!(store.len().await, 1);

        let handle = spawn_session_reaper(
            store.clone(),
            Duration::from_millis(0),
            Duration::from_millis(20),
        );
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn keeps_active_sessions() {
        let store = SessionStore::new();
        store.create("describe").await;

        let handle = spawn_session_reaper(
            store.clone(),
            Duration::from_secs(3600),
            Duration::from_millis(20),
        );
        tokio::time::sleep(Duration::from_millis(80)).await;
        handle.abort();

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn survives_ttl_beyond_clock_range() {
        let store = SessionStore::new();
        store.create("describe").await;

        let handle = spawn_session_reaper(
            store.clone(),
            Duration::from_secs(10_000_000_000_000),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_finished());
        handle.abort();

        assert_eq!(store.len().await, 1);
    }
}
