//! Counter store selection from configuration.

use std::sync::Arc;

use tracing::{info, warn};

use tenantauth_core::config::{CounterBackend, CounterStoreConfig};
use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_core::traits::CounterStore;

/// Builds the configured store. `None` means throttling is off.
pub async fn connect(config: &CounterStoreConfig) -> AppResult<Option<Arc<dyn CounterStore>>> {
    let store: Arc<dyn CounterStore> = match config.backend {
        #[cfg(feature = "memory")]
        CounterBackend::Memory => {
            info!(max_keys = config.memory_max_keys, "Using in-memory counter store");
            Arc::new(crate::memory::MemoryCounterStore::new(config.memory_max_keys))
        }
        #[cfg(feature = "redis-backend")]
        CounterBackend::Redis => Arc::new(crate::redis::RedisCounterStore::connect(config).await?),
        CounterBackend::None => {
            warn!("No counter store configured; login throttling is disabled");
            return Ok(None);
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(AppError::configuration(format!(
                "Counter backend {other:?} is not compiled into this build"
            )));
        }
    };
    Ok(Some(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_disables_throttling() {
        let config = CounterStoreConfig {
            backend: CounterBackend::None,
            ..CounterStoreConfig::default()
        };
        assert!(connect(&config).await.unwrap().is_none());
    }

    #[cfg(feature = "memory")]
    #[tokio::test]
    async fn test_memory_backend() {
        let store = connect(&CounterStoreConfig::default()).await.unwrap().unwrap();
        assert_eq!(store.hit("k", std::time::Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(store.count("k").await.unwrap(), 1);
    }
}
