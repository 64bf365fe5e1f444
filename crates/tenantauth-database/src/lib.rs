//! # tenantauth-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the TenantAuth tables.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
