//! Postgres-backed directory over the user and tenant repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tenantauth_core::result::AppResult;
use tenantauth_database::repositories::{TenantRepository, UserRepository};
use tenantauth_entity::tenant::{Tenant, TenantMember, TenantMembership, TenantRole};
use tenantauth_entity::user::{NewUser, User};

use super::{MemberStore, MembershipLookup, TenantStore, UserStore};

/// Directory backed by the `users`, `tenants` and `tenant_users` tables.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    users: UserRepository,
    tenants: TenantRepository,
}

impl PgDirectory {
    /// Creates a directory over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tenants: TenantRepository::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PgDirectory {
    async fn find_login_user(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn create_user(&self, data: NewUser) -> AppResult<User> {
        self.users.create(&data).await
    }
}

#[async_trait]
impl MembershipLookup for PgDirectory {
    async fn get_role(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<String>> {
        self.tenants.find_role(tenant_id, user_id).await
    }
}

#[async_trait]
impl TenantStore for PgDirectory {
    async fn create_tenant_with_owner(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> AppResult<(Tenant, TenantMembership)> {
        self.tenants.create_with_owner(name, owner_id).await
    }
    async fn bootstrap_owner(
        &self,
        owner: NewUser,
        tenant_name: &str,
    ) -> AppResult<(User, Tenant, TenantMembership)> {
        self.tenants.bootstrap(&owner, tenant_name).await
    }
}

#[async_trait]
impl MemberStore for PgDirectory {
    async fn list_members(&self, tenant_id: Uuid) -> AppResult<Vec<TenantMember>> {
        self.tenants.list_members(tenant_id).await
    }

    async fn insert_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<TenantMembership> {
        self.tenants.add_member(tenant_id, user_id, role).await
    }

    async fn set_member_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<bool> {
        self.tenants.update_role(tenant_id, user_id, role).await
    }

    async fn delete_member(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        self.tenants.remove_member(tenant_id, user_id).await
    }
}
