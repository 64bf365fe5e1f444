//! # tenantauth-cache
//!
//! Counter store backends for login throttling:
//!
//! - **memory**: a sharded in-process map (`dashmap`), one set of counters
//!   per process
//! - **redis**: counters shared by every instance through one Redis server
//!
//! [`backend::connect`] picks one from [`CounterStoreConfig`] or returns
//! `None` when throttling is switched off.
//!
//! [`CounterStoreConfig`]: tenantauth_core::config::CounterStoreConfig

pub mod backend;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis;

#[cfg(feature = "memory")]
pub use memory::MemoryCounterStore;
#[cfg(feature = "redis-backend")]
pub use redis::RedisCounterStore;
