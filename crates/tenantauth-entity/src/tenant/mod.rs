//! Tenant and membership domain entities.

pub mod membership;
pub mod model;
pub mod role;

pub use membership::{TenantMember, TenantMembership};
pub use model::Tenant;
pub use role::TenantRole;
