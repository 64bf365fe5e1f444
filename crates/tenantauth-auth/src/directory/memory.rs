//! In-memory directory for tests and single-process development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_entity::tenant::{Tenant, TenantMember, TenantMembership, TenantRole};
use tenantauth_entity::user::{NewUser, User, UserStatus};

use super::{MemberStore, MembershipLookup, TenantStore, UserStore};

#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<Uuid, User>,
    tenants: HashMap<Uuid, Tenant>,
    /// Keyed by (tenant_id, user_id); the value is the stored role text.
    memberships: HashMap<(Uuid, Uuid), TenantMembership>,
}

impl InnerState {
    fn insert_user(&mut self, data: NewUser) -> AppResult<User> {
        if self.users.values().any(|u| u.email == data.email) {
            return Err(AppError::conflict(format!(
                "Email '{}' is already registered",
                data.email
            )));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn insert_owned_tenant(&mut self, name: &str, owner_id: Uuid) -> (Tenant, TenantMembership) {
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
        };
        let membership = TenantMembership {
            tenant_id: tenant.id,
            user_id: owner_id,
            role: TenantRole::Owner.as_str().to_string(),
            created_at: now,
        };
        self.tenants.insert(tenant.id, tenant.clone());
        self.memberships
            .insert((tenant.id, owner_id), membership.clone());
        (tenant, membership)
    }
}

/// Users, tenants, and memberships held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    state: Arc<RwLock<InnerState>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a membership with an arbitrary stored role string.
    ///
    /// Accepts roles outside [`TenantRole`] so that callers can exercise the
    /// invalid-role path.
    pub async fn add_member(&self, tenant_id: Uuid, user_id: Uuid, role: &str) {
        let membership = TenantMembership {
            tenant_id,
            user_id,
            role: role.to_string(),
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .memberships
            .insert((tenant_id, user_id), membership);
    }

    /// Changes a user's account status. Returns `false` for unknown users.
    pub async fn set_status(&self, user_id: Uuid, status: UserStatus) -> bool {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.status = status;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryDirectory {
    async fn find_login_user(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, data: NewUser) -> AppResult<User> {
        self.state.write().await.insert_user(data)
    }
}

#[async_trait]
impl MembershipLookup for MemoryDirectory {
    async fn get_role(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(&(tenant_id, user_id))
            .map(|m| m.role.clone()))
    }
}

#[async_trait]
impl TenantStore for MemoryDirectory {
    async fn create_tenant_with_owner(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> AppResult<(Tenant, TenantMembership)> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&owner_id) {
            return Err(AppError::not_found(format!("User {owner_id} not found")));
        }
        Ok(state.insert_owned_tenant(name, owner_id))
    }

    async fn bootstrap_owner(
        &self,
        owner: NewUser,
        tenant_name: &str,
    ) -> AppResult<(User, Tenant, TenantMembership)> {
        let mut state = self.state.write().await;
        let user = state.insert_user(owner)?;
        let (tenant, membership) = state.insert_owned_tenant(tenant_name, user.id);
        Ok((user, tenant, membership))
    }
}

#[async_trait]
impl MemberStore for MemoryDirectory {
    async fn list_members(&self, tenant_id: Uuid) -> AppResult<Vec<TenantMember>> {
        let state = self.state.read().await;
        let mut members: Vec<TenantMember> = state
            .memberships
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .filter_map(|m| {
                state.users.get(&m.user_id).map(|user| TenantMember {
                    user_id: m.user_id,
                    email: user.email.clone(),
                    role: m.role.clone(),
                    created_at: m.created_at,
                })
            })
            .collect();
        members.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(members)
    }

    async fn insert_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<TenantMembership> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        if state.memberships.contains_key(&(tenant_id, user_id)) {
            return Err(AppError::conflict(format!(
                "User {user_id} is already a member of tenant {tenant_id}"
            )));
        }
        let membership = TenantMembership {
            tenant_id,
            user_id,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        state
            .memberships
            .insert((tenant_id, user_id), membership.clone());
        Ok(membership)
    }

    async fn set_member_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: TenantRole,
    ) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(match state.memberships.get_mut(&(tenant_id, user_id)) {
            Some(membership) => {
                membership.role = role.as_str().to_string();
                true
            }
            None => false,
        })
    }

    async fn delete_member(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.memberships.remove(&(tenant_id, user_id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantauth_core::ErrorKind;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let dir = MemoryDirectory::new();
        dir.create_user(new_user("a@example.com")).await.unwrap();
        let err = dir
            .create_user(new_user("a@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_tenant_owner_membership() {
        let dir = MemoryDirectory::new();
        let user = dir.create_user(new_user("o@example.com")).await.unwrap();
        let (tenant, membership) = dir.create_tenant_with_owner("Acme", user.id).await.unwrap();
        assert_eq!(membership.role, "owner");
        assert_eq!(
            dir.get_role(tenant.id, user.id).await.unwrap().as_deref(),
            Some("owner")
        );
        assert!(dir.get_role(tenant.id, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_owner_rejected() {
        let dir = MemoryDirectory::new();
        let err = dir
            .create_tenant_with_owner("Acme", Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_set_status() {
        let dir = MemoryDirectory::new();
        let user = dir.create_user(new_user("d@example.com")).await.unwrap();
        assert!(dir.set_status(user.id, UserStatus::Disabled).await);
        let found = dir.find_login_user("d@example.com").await.unwrap().unwrap();
        assert!(!found.can_login());
        assert!(!dir.set_status(Uuid::new_v4(), UserStatus::Active).await);
    }

    #[tokio::test]
    async fn test_bootstrap_owner_conflict_keeps_nothing() {
        let dir = MemoryDirectory::new();
        let (user, tenant, membership) = dir
            .bootstrap_owner(new_user("boot@example.com"), "Acme")
            .await
            .unwrap();
        assert_eq!(membership.user_id, user.id);
        assert_eq!(membership.tenant_id, tenant.id);

        let err = dir
            .bootstrap_owner(new_user("boot@example.com"), "Other")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(dir.state.read().await.tenants.len(), 1);
    }

    #[tokio::test]
    async fn test_member_management() {
        let dir = MemoryDirectory::new();
        let owner = dir.create_user(new_user("own@example.com")).await.unwrap();
        let other = dir.create_user(new_user("oth@example.com")).await.unwrap();
        let (tenant, _) = dir.create_tenant_with_owner("Acme", owner.id).await.unwrap();

        dir.insert_member(tenant.id, other.id, TenantRole::Member)
            .await
            .unwrap();
        let err = dir
            .insert_member(tenant.id, other.id, TenantRole::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = dir
            .insert_member(tenant.id, Uuid::new_v4(), TenantRole::Member)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let members = dir.list_members(tenant.id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].email, "own@example.com");
        assert_eq!(members[0].role, "owner");

        assert!(dir.set_member_role(tenant.id, other.id, TenantRole::Admin).await.unwrap());
        assert_eq!(dir.get_role(tenant.id, other.id).await.unwrap().as_deref(), Some("admin"));
        assert!(!dir.set_member_role(tenant.id, Uuid::new_v4(), TenantRole::Admin).await.unwrap());

        assert!(dir.delete_member(tenant.id, other.id).await.unwrap());
        assert!(!dir.delete_member(tenant.id, other.id).await.unwrap());
        assert!(dir.list_members(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
