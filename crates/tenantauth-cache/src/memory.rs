//! Per-process counter store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::{debug, warn};

use tenantauth_core::config::CounterStoreConfig;
use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_core::traits::CounterStore;

/// Minimum spacing between two sweeps of the whole map.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);
const NEVER_SWEPT: u64 = u64::MAX;

#[derive(Debug, Clone, Copy)]
struct Window {
    hits: u64,
    closes_at: Instant,
}

impl Window {
    fn opened(now: Instant, length: Duration) -> Self {
        Self {
            hits: 0,
            closes_at: now + length,
        }
    }

    fn is_open(&self, now: Instant) -> bool {
        now < self.closes_at
    }

    /// Counts one hit, reopening the window first if it has closed.
    fn record(&mut self, now: Instant, length: Duration) -> u64 {
        if !self.is_open(now) {
            *self = Self::opened(now, length);
        }
        self.hits += 1;
        self.hits
    }
}

/// Counters in a `DashMap` keyed by counter name.
///
/// The entry API keeps the shard locked across the read-modify-write, so
/// `hit` is atomic per key. The map never holds more than `max_keys`
/// entries: a new key needs a free slot, and when none is left closed
/// windows are swept (at most once per [`SWEEP_INTERVAL`]). If the map is
/// still full the hit is refused with `Unavailable`. Time comes from the
/// tokio clock.
#[derive(Debug, Clone)]
pub struct MemoryCounterStore {
    windows: Arc<DashMap<String, Window>>,
    /// Slots taken, including reservations not yet inserted.
    slots: Arc<AtomicUsize>,
    /// Milliseconds after `epoch` of the last sweep.
    last_sweep_ms: Arc<AtomicU64>,
    epoch: Instant,
    max_keys: usize,
}

impl MemoryCounterStore {
    /// Create a store holding at most `max_keys` counters (minimum 1).
    pub fn new(max_keys: usize) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            slots: Arc::new(AtomicUsize::new(0)),
            last_sweep_ms: Arc::new(AtomicU64::new(NEVER_SWEPT)),
            epoch: Instant::now(),
            max_keys: max_keys.max(1),
        }
    }

    /// Number of counters currently held.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Check if no counters are held.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn try_reserve(&self) -> bool {
        self.slots
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
                (taken < self.max_keys).then_some(taken + 1)
            })
            .is_ok()
    }

    fn release(&self, count: usize) {
        if count > 0 {
            self.slots.fetch_sub(count, Ordering::AcqRel);
        }
    }

    /// Claims a slot for a new key, sweeping once if the map is full.
    fn reserve_slot(&self, now: Instant) -> bool {
        if self.try_reserve() {
            return true;
        }
        self.claim_sweep(now) && {
            self.sweep(now);
            self.try_reserve()
        }
    }

    /// Returns true for exactly one caller per sweep interval.
    fn claim_sweep(&self, now: Instant) -> bool {
        let at = u64::try_from(now.duration_since(self.epoch).as_millis()).unwrap_or(u64::MAX - 1);
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        let interval = SWEEP_INTERVAL.as_millis() as u64;
        if last != NEVER_SWEPT && at.saturating_sub(last) < interval {
            return false;
        }
        self.last_sweep_ms
            .compare_exchange(last, at, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn sweep(&self, now: Instant) {
        let mut removed = 0usize;
        self.windows.retain(|_, window| {
            let open = window.is_open(now);
            if !open {
                removed += 1;
            }
            open
        });
        self.release(removed);
        debug!(removed, remaining = self.windows.len(), "Swept closed counter windows");
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new(CounterStoreConfig::default().memory_max_keys)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn count(&self, key: &str) -> AppResult<u64> {
        let now = Instant::now();
        Ok(self
            .windows
            .get(key)
            .filter(|window| window.is_open(now))
            .map_or(0, |window| window.hits))
    }

    async fn hit(&self, key: &str, window: Duration) -> AppResult<u64> {
        let now = Instant::now();
        if let Some(mut existing) = self.windows.get_mut(key) {
            return Ok(existing.record(now, window));
        }

        if !self.reserve_slot(now) {
            warn!(max_keys = self.max_keys, "Counter store full; hit refused");
            return Err(AppError::unavailable("In-memory counter store is full"));
        }
        match self.windows.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                self.release(1);
                Ok(occupied.get_mut().record(now, window))
            }
            Entry::Vacant(vacant) => {
                let mut opened = Window::opened(now, window);
                let hits = opened.record(now, window);
                vacant.insert(opened);
                Ok(hits)
            }
        }
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        if self.windows.remove(key).is_some() {
            self.release(1);
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantauth_core::ErrorKind;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_absent_key_counts_zero() {
        let store = MemoryCounterStore::default();
        assert_eq!(store.count("nobody").await.unwrap(), 0);
        store.reset("nobody").await.unwrap();
        store.ping().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_is_fixed_from_first_hit() {
        let store = MemoryCounterStore::default();
        assert_eq!(store.hit("k", 10 * MINUTE).await.unwrap(), 1);

        tokio::time::advance(9 * MINUTE).await;
        assert_eq!(store.hit("k", 10 * MINUTE).await.unwrap(), 2);
        assert_eq!(store.count("k").await.unwrap(), 2);

        tokio::time::advance(MINUTE).await;
        assert_eq!(store.count("k").await.unwrap(), 0);
        assert_eq!(store.hit("k", 10 * MINUTE).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_only_touches_one_key() {
        let store = MemoryCounterStore::default();
        store.hit("a", MINUTE).await.unwrap();
        store.hit("b", MINUTE).await.unwrap();
        store.reset("a").await.unwrap();
        assert_eq!(store.count("a").await.unwrap(), 0);
        assert_eq!(store.count("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_hits_are_distinct() {
        let store = MemoryCounterStore::default();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.hit("shared", MINUTE).await.unwrap()
            }));
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=32).collect::<Vec<u64>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_map_sweeps_closed_windows() {
        let store = MemoryCounterStore::new(2);
        store.hit("a", Duration::from_secs(1)).await.unwrap();
        store.hit("b", Duration::from_secs(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        store.hit("c", MINUTE).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_never_exceed_capacity() {
        let store = MemoryCounterStore::new(16);
        let mut handles = Vec::new();
        for task in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut refused = 0;
                for i in 0..500 {
                    match store.hit(&format!("{task}:{i}"), MINUTE).await {
                        Ok(_) => {}
                        Err(err) => {
                            assert_eq!(err.kind, ErrorKind::Unavailable);
                            refused += 1;
                        }
                    }
                    assert!(store.len() <= 16);
                }
                refused
            }));
        }
        let mut refused = 0;
        for handle in handles {
            refused += handle.await.unwrap();
        }
        assert_eq!(store.len(), 16);
        assert_eq!(refused, 8 * 500 - 16);
    }

    #[tokio::test]
    async fn test_known_keys_still_count_when_full() {
        let store = MemoryCounterStore::new(1);
        assert_eq!(store.hit("a", MINUTE).await.unwrap(), 1);
        assert!(store.hit("b", MINUTE).await.is_err());
        assert_eq!(store.hit("a", MINUTE).await.unwrap(), 2);

        store.reset("a").await.unwrap();
        assert_eq!(store.hit("b", MINUTE).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_are_spaced_out() {
        let store = MemoryCounterStore::new(1);
        store.hit("a", Duration::from_secs(1)).await.unwrap();
        // Sweeps, but "a" is still open.
        assert!(store.hit("b", MINUTE).await.is_err());

        tokio::time::advance(Duration::from_secs(2)).await;
        // "a" has closed, but the last sweep was too recent.
        assert!(store.hit("b", MINUTE).await.is_err());

        tokio::time::advance(SWEEP_INTERVAL).await;
        assert_eq!(store.hit("b", MINUTE).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }
}
