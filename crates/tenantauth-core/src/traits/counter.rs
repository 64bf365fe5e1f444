//! Windowed counters shared by every engine instance.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// A store of integer counters that reset when their window closes.
///
/// The first [`CounterStore::hit`] on an absent key opens a window; hits
/// inside an open window never extend it. Implementations must make `hit`
/// atomic per key so that concurrent callers each observe a distinct count.
#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug + 'static {
    /// Current count, or zero when the key is absent or its window closed.
    async fn count(&self, key: &str) -> AppResult<u64>;

    /// Adds one and returns the new count.
    async fn hit(&self, key: &str, window: Duration) -> AppResult<u64>;

    /// Drops the key and its window.
    async fn reset(&self, key: &str) -> AppResult<()>;

    /// Round-trips to the backend.
    async fn ping(&self) -> AppResult<()>;
}
