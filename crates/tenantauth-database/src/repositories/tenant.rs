//! Tenant and membership repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use tenantauth_core::error::{AppError, ErrorKind};
use tenantauth_core::result::AppResult;
use tenantauth_entity::tenant::{Tenant, TenantMember, TenantMembership, TenantRole};
use tenantauth_entity::user::{NewUser, User};

use crate::error::{is_unique_violation, map_sqlx_error};

/// Repository for `tenants` and `tenant_users`.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    /// Create a new tenant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a tenant by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_tenant_by_id", e))
    }

    /// Create a tenant and its owner membership in one transaction.
    pub async fn create_with_owner(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> AppResult<(Tenant, TenantMembership)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_tenant_begin", e))?;

        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING *",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_tenant", e))?;

        let membership = sqlx::query_as::<_, TenantMembership>(
            "INSERT INTO tenant_users (tenant_id, user_id, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(tenant.id)
        .bind(owner_id)
        .bind(TenantRole::Owner.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_tenant_owner", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_tenant_commit", e))?;
        Ok((tenant, membership))
    }

    /// Create the owner account, its tenant, and the owner membership in
    /// one transaction. A taken email is a `Conflict` and nothing is kept.
    pub async fn bootstrap(
        &self,
        owner: &NewUser,
        tenant_name: &str,
    ) -> AppResult<(User, Tenant, TenantMembership)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("bootstrap_begin", e))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::with_source(
                    ErrorKind::Conflict,
                    format!("Email '{}' is already registered", owner.email),
                    e,
                )
            } else {
                map_sqlx_error("bootstrap_user", e)
            }
        })?;

        let tenant = sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (name) VALUES ($1) RETURNING *",
        )
        .bind(tenant_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("bootstrap_tenant", e))?;

        let membership = sqlx::query_as::<_, TenantMembership>(
            "INSERT INTO tenant_users (tenant_id, user_id, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(tenant.id)
        .bind(user.id)
        .bind(TenantRole::Owner.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("bootstrap_owner", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("bootstrap_commit", e))?;
        Ok((user, tenant, membership))
    }

    /// Add a user to a tenant with the given role.
    ///
    /// An existing membership is a `Conflict`; an unknown user or tenant
    /// is `NotFound`.
    pub async fn add_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<TenantMembership> {
        sqlx::query_as::<_, TenantMembership>(
            "INSERT INTO tenant_users (tenant_id, user_id, role) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_tenant_member", e))
    }

    /// Members of a tenant with their emails, oldest first.
    pub async fn list_members(&self, tenant_id: Uuid) -> AppResult<Vec<TenantMember>> {
        sqlx::query_as::<_, TenantMember>(
            r#"
            SELECT tu.user_id, u.email, tu.role, tu.created_at
            FROM tenant_users tu
            JOIN users u ON u.id = tu.user_id
            WHERE tu.tenant_id = $1
            ORDER BY tu.created_at ASC, tu.user_id ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tenant_members", e))
    }

    /// Change a member's role. Returns `false` when the user is not a
    /// member.
    pub async fn update_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<bool> {
        let done = sqlx::query(
            "UPDATE tenant_users SET role = $3 WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_tenant_member_role", e))?;
        Ok(done.rows_affected() > 0)
    }

    /// Remove a membership. Returns `false` when there was none.
    pub async fn remove_member(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let done = sqlx::query("DELETE FROM tenant_users WHERE tenant_id = $1 AND user_id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_tenant_member", e))?;
        Ok(done.rows_affected() > 0)
    }

    /// Return the stored role string of a membership, if any.
    pub async fn find_role(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM tenant_users WHERE tenant_id = $1 AND user_id = $2",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_tenant_role", e))
    }
}
