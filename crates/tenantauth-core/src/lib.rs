//! # tenantauth-core
//!
//! Core crate for TenantAuth. Contains the closed error taxonomy, the
//! configuration schema, and the windowed counter trait shared by the
//! rate limiter and its backends.
//!
//! This crate has **no** internal dependencies on other TenantAuth crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind, Outward};
pub use result::AppResult;
