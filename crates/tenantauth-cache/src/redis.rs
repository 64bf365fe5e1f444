//! Redis counter store.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use tracing::info;

use tenantauth_core::config::{CounterStoreConfig, redact_url};
use tenantauth_core::error::{AppError, ErrorKind};
use tenantauth_core::result::AppResult;
use tenantauth_core::traits::CounterStore;

/// Counters shared through Redis.
///
/// Each window is a key whose TTL is set when the key is created and
/// left alone afterwards.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Opens a reconnecting connection to `config.redis_url`.
    pub async fn connect(config: &CounterStoreConfig) -> AppResult<Self> {
        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid Redis URL", e)
        })?;

        info!(url = %redact_url(&config.redis_url), "Connecting to Redis counter store");
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }
}

fn unavailable(err: RedisError) -> AppError {
    AppError::with_source(ErrorKind::Unavailable, format!("Redis error: {err}"), err)
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn count(&self, key: &str) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let hits: Option<u64> = conn.get(self.key(key)).await.map_err(unavailable)?;
        Ok(hits.unwrap_or(0))
    }

    async fn hit(&self, key: &str, window: Duration) -> AppResult<u64> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        // SET NX only creates the key (and its TTL) when absent; INCR keeps the TTL.
        let (hits,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("EX")
            .arg(window.as_secs().max(1))
            .arg("NX")
            .ignore()
            .incr(&key, 1u64)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(hits)
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await.map_err(unavailable)?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_url_is_a_configuration_error() {
        let config = CounterStoreConfig {
            redis_url: "memcached://cache:11211".to_string(),
            ..CounterStoreConfig::default()
        };
        let err = RedisCounterStore::connect(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
