//! User, tenant, and membership lookups consumed by the session flows and
//! the policy enforcer.
//!
//! Each trait has a Postgres-backed implementation over the repositories in
//! `tenantauth-database` and an in-memory implementation for tests and
//! single-process development.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use tenantauth_core::result::AppResult;
use tenantauth_entity::tenant::{Tenant, TenantMember, TenantMembership, TenantRole};
use tenantauth_entity::user::{NewUser, User};

pub use memory::MemoryDirectory;
pub use postgres::PgDirectory;

/// Credential store for login and registration.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Find a user by normalised email, regardless of status.
    async fn find_login_user(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a user. A duplicate email is a `Conflict`.
    async fn create_user(&self, data: NewUser) -> AppResult<User>;
}

/// Tenant membership lookup.
#[async_trait]
pub trait MembershipLookup: Send + Sync + std::fmt::Debug {
    /// Stored role string for the membership, or `None` when the user is
    /// not a member of the tenant.
    async fn get_role(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<String>>;
}

/// Tenant creation for bootstrap.
#[async_trait]
pub trait TenantStore: Send + Sync + std::fmt::Debug {
    /// Create a tenant and an `owner` membership for `owner_id` atomically.
    async fn create_tenant_with_owner(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> AppResult<(Tenant, TenantMembership)>;

    /// Create a new owner account together with its tenant and owner
    /// membership. Either all three exist afterwards or none does.
    async fn bootstrap_owner(
        &self,
        owner: NewUser,
        tenant_name: &str,
    ) -> AppResult<(User, Tenant, TenantMembership)>;
}

/// Membership management inside one tenant.
#[async_trait]
pub trait MemberStore: Send + Sync + std::fmt::Debug {
    /// Members with their emails, oldest membership first.
    async fn list_members(&self, tenant_id: Uuid) -> AppResult<Vec<TenantMember>>;

    /// Add a membership. Already a member is `Conflict`; an unknown user
    /// is `NotFound`.
    async fn insert_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<TenantMembership>;

    /// Change a member's role; `false` when the user is not a member.
    async fn set_member_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<bool>;

    /// Remove a membership; `false` when there was none.
    async fn delete_member(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<bool>;
}
