//! Tenant-scoped role-based access control.
//!
//! Tenant roles map onto a closed set of policy subjects. Rules grant a
//! subject an action on a resource within a domain (`tenant:{id}`); any
//! request no rule matches is denied.

pub mod enforcer;
pub mod matcher;
pub mod memory;
pub mod role;
pub mod seed;
pub mod store;

pub use enforcer::{Decision, PolicyEnforcer, domain_for_tenant};
pub use memory::MemoryPolicyStore;
pub use role::{PolicySubject, map_role};
pub use store::{PgPolicyStore, PolicyStore};
