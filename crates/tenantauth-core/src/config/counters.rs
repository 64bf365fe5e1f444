//! Counter store selection.

use serde::{Deserialize, Serialize};

/// Which backend holds the login failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// Per-process map; counters are not shared between instances.
    #[default]
    Memory,
    /// Shared Redis server.
    Redis,
    /// No store. Login throttling is off.
    None,
}

/// `[counters]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterStoreConfig {
    #[serde(default)]
    pub backend: CounterBackend,
    /// Connection URL when `backend = "redis"`.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Prepended to every Redis key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Live keys kept by the memory backend before it sweeps closed windows.
    #[serde(default = "default_memory_max_keys")]
    pub memory_max_keys: usize,
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self {
            backend: CounterBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            memory_max_keys: default_memory_max_keys(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "tenantauth:".to_string()
}

fn default_memory_max_keys() -> usize {
    100_000
}
