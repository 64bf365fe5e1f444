//! # tenantauth-entity
//!
//! Rows and value types shared by the storage and engine crates: users,
//! tenants and memberships, refresh sessions with their rotation outcome,
//! and policy rules. Table rows derive `sqlx::FromRow`.

pub mod policy;
pub mod refresh_session;
pub mod tenant;
pub mod user;
