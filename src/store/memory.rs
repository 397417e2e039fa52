//! In-process fallback counter store.
//!
//! Keeps a bounded timestamp deque per window key, pruned lazily on each
//! check. Locking is an arena-of-locks: the outer map mutex is held only
//! long enough to fetch (or create) the per-key window, and the per-key
//! mutex is held across the whole check-and-increment. Nothing here does
//! I/O, so no lock is ever held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::warn;

use super::{CounterStore, PenaltyKey, WindowKey};
use crate::errors::StoreError;

/// Timestamp history for one window key. Length never exceeds the ceiling
/// it is checked against, so memory stays bounded.
type Window = VecDeque<Instant>;

/// In-memory [`CounterStore`] with per-process accuracy.
///
/// Correct for a single process; a multi-process deployment should use a
/// shared atomic store instead. The external contract is identical.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: Mutex<HashMap<WindowKey, Arc<Mutex<Window>>>>,
    penalties: Mutex<HashMap<PenaltyKey, Instant>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the window map, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a slightly stale counter, which is
    /// better than panicking inside the traffic controller.
    fn lock_windows(&self) -> MutexGuard<'_, HashMap<WindowKey, Arc<Mutex<Window>>>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Counter store window map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_penalties(&self) -> MutexGuard<'_, HashMap<PenaltyKey, Instant>> {
        self.penalties.lock().unwrap_or_else(|poisoned| {
            warn!("Counter store penalty map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn window_for(&self, key: &WindowKey) -> Arc<Mutex<Window>> {
        let mut windows = self.lock_windows();
        windows
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    fn lock_window(slot: &Arc<Mutex<Window>>) -> MutexGuard<'_, Window> {
        slot.lock().unwrap_or_else(|poisoned| {
            warn!("Counter store window mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn prune(events: &mut Window, window: Duration, now: Instant) {
        while let Some(front) = events.front() {
            if now.duration_since(*front) >= window {
                events.pop_front();
            } else {
                break;
            }
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn try_increment(
        &self,
        key: &WindowKey,
        window: Duration,
        ceiling: u32,
    ) -> Result<bool, StoreError> {
        let slot = self.window_for(key);
        let mut events = Self::lock_window(&slot);

        let now = Instant::now();
        Self::prune(&mut events, window, now);

        if (events.len() as u32) < ceiling {
            events.push_back(now);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn has_headroom(
        &self,
        key: &WindowKey,
        window: Duration,
        ceiling: u32,
    ) -> Result<bool, StoreError> {
        let slot = self.window_for(key);
        let mut events = Self::lock_window(&slot);

        Self::prune(&mut events, window, Instant::now());
        Ok((events.len() as u32) < ceiling)
    }

    async fn activate_penalty(
        &self,
        key: &PenaltyKey,
        cooldown: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        // A cool-down too large for the clock to represent is clamped to
        // a year, which is indefinite for practical purposes.
        let expiry = now
            .checked_add(cooldown)
            .unwrap_or_else(|| now + Duration::from_secs(31_536_000));
        let mut penalties = self.lock_penalties();
        penalties.insert(key.clone(), expiry);
        Ok(())
    }

    async fn penalty_active(&self, key: &PenaltyKey) -> Result<bool, StoreError> {
        let mut penalties = self.lock_penalties();
        match penalties.get(key) {
            Some(expiry) if *expiry > Instant::now() => Ok(true),
            Some(_) => {
                // Expired; drop the record so the map stays small.
                penalties.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Granularity;

    fn key(provider: &str) -> WindowKey {
        WindowKey::new("test", provider, "default", Granularity::Minute)
    }

    #[tokio::test]
    async fn test_window_saturates_at_ceiling() {
        let store = MemoryCounterStore::new();
        let key = key("tickfeed-pro");
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            assert!(store.try_increment(&key, window, 3).await.unwrap());
        }
        assert!(!store.try_increment(&key, window, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_saturated_window_records_nothing() {
        let store = MemoryCounterStore::new();
        let key = key("tickfeed-pro");
        let window = Duration::from_millis(50);

        assert!(store.try_increment(&key, window, 1).await.unwrap());
        // Denied checks must not extend the window.
        assert!(!store.try_increment(&key, window, 1).await.unwrap());
        assert!(!store.try_increment(&key, window, 1).await.unwrap());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.try_increment(&key, window, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_events_expire_out_of_window() {
        let store = MemoryCounterStore::new();
        let key = key("newswire-basic");
        let window = Duration::from_millis(30);

        assert!(store.try_increment(&key, window, 2).await.unwrap());
        assert!(store.try_increment(&key, window, 2).await.unwrap());
        assert!(!store.try_increment(&key, window, 2).await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.try_increment(&key, window, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_window_keys_are_isolated() {
        let store = MemoryCounterStore::new();
        let window = Duration::from_secs(60);
        let a = key("provider-a");
        let b = key("provider-b");

        assert!(store.try_increment(&a, window, 1).await.unwrap());
        assert!(!store.try_increment(&a, window, 1).await.unwrap());

        // Same ceiling, different provider: unaffected.
        assert!(store.try_increment(&b, window, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_headroom_check_records_nothing() {
        let store = MemoryCounterStore::new();
        let key = key("tickfeed-pro");
        let window = Duration::from_secs(60);

        // Any number of surveys leaves the budget untouched.
        for _ in 0..10 {
            assert!(store.has_headroom(&key, window, 2).await.unwrap());
        }

        assert!(store.try_increment(&key, window, 2).await.unwrap());
        assert!(store.has_headroom(&key, window, 2).await.unwrap());
        assert!(store.try_increment(&key, window, 2).await.unwrap());

        assert!(!store.has_headroom(&key, window, 2).await.unwrap());
        assert!(!store.try_increment(&key, window, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_cooldown_does_not_panic() {
        let store = MemoryCounterStore::new();
        let key = PenaltyKey::new("test", "tickfeed-pro", "default");

        store.activate_penalty(&key, Duration::MAX).await.unwrap();
        assert!(store.penalty_active(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_penalty_lifecycle() {
        let store = MemoryCounterStore::new();
        let key = PenaltyKey::new("test", "tickfeed-pro", "default");

        assert!(!store.penalty_active(&key).await.unwrap());

        store
            .activate_penalty(&key, Duration::from_millis(30))
            .await
            .unwrap();
        assert!(store.penalty_active(&key).await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!store.penalty_active(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_penalty_reactivation_replaces_expiry() {
        let store = MemoryCounterStore::new();
        let key = PenaltyKey::new("test", "tickfeed-pro", "default");

        store
            .activate_penalty(&key, Duration::from_millis(10))
            .await
            .unwrap();
        store
            .activate_penalty(&key, Duration::from_millis(80))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        // First expiry has passed; second activation keeps it live.
        assert!(store.penalty_active(&key).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_checks_respect_ceiling() {
        let store = Arc::new(MemoryCounterStore::new());
        let key = key("burst-provider");
        let window = Duration::from_secs(60);
        let ceiling = 25u32;

        let mut handles = Vec::new();
        for _ in 0..(ceiling * 2) {
            let store = store.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                store.try_increment(&key, window, ceiling).await.unwrap()
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, ceiling);
    }
}
