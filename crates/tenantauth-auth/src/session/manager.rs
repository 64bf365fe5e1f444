//! Session orchestration: register, bootstrap, login, refresh, logout,
//! tenant switching, request authentication, and tenant member management.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tenantauth_core::config::AuthConfig;
use tenantauth_core::error::{AppError, ErrorKind};
use tenantauth_core::result::AppResult;
use tenantauth_entity::user::{NewUser, User, model::normalize_email};

use crate::directory::{MemberStore, MembershipLookup, TenantStore, UserStore};
use crate::jwt::{JwtDecoder, JwtEncoder, TokenType};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::ratelimit::{LoginRateKey, LoginRateLimiter};
use crate::rbac::PolicyEnforcer;
use crate::timeout::with_timeout;

use super::context::{AuthContext, RequestContext};
use super::dto::{
    AddMemberRequest, BootstrapRequest, BootstrapResponse, ListMembersResponse, LoginRequest,
    LoginResponse, LogoutAllResponse, LogoutRequest, LogoutResponse, MemberItem,
    MemberRemovedResponse, MemberResponse, MyRolesResponse, RefreshRequest, RefreshResponse,
    RegisterRequest, RegisteredUser, SwitchTenantRequest, SwitchTenantResponse, TenantSummary,
    TokenPair, UpdateMemberRoleRequest, UserSummary, parse_member_role, validate_request,
};
use super::ledger::{IssuedRefreshToken, RefreshLedger};

/// Policy resource for listing and adding tenant members.
pub const MEMBERS_RESOURCE: &str = "/v1/admin/tenants/:tenantId/members";
/// Policy resource for changing or removing one member.
pub const MEMBER_RESOURCE: &str = "/v1/admin/tenants/:tenantId/members/:uid";
/// Policy resource for reading the caller's own roles.
pub const MY_ROLES_RESOURCE: &str = "/v1/admin/tenants/:tenantId/me/roles";

/// Drives every credential exchange.
#[derive(Clone)]
pub struct SessionManager {
    /// Access token signer.
    encoder: Arc<JwtEncoder>,
    /// Access token verifier.
    decoder: Arc<JwtDecoder>,
    /// Refresh session ledger.
    ledger: RefreshLedger,
    /// Failed-login throttling.
    limiter: LoginRateLimiter,
    /// Tenant policy checks.
    enforcer: PolicyEnforcer,
    /// Credential store.
    users: Arc<dyn UserStore>,
    /// Tenant creation.
    tenants: Arc<dyn TenantStore>,
    /// Membership lookup for tenant binding.
    memberships: Arc<dyn MembershipLookup>,
    /// Membership management.
    members: Arc<dyn MemberStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password policy.
    validator: PasswordValidator,
    /// Auth configuration.
    config: AuthConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("issuer", &self.config.jwt_issuer)
            .field("access_ttl_minutes", &self.config.access_ttl_minutes)
            .field("refresh_ttl_hours", &self.config.refresh_ttl_hours)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a session manager with all required dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
        ledger: RefreshLedger,
        limiter: LoginRateLimiter,
        enforcer: PolicyEnforcer,
        users: Arc<dyn UserStore>,
        tenants: Arc<dyn TenantStore>,
        memberships: Arc<dyn MembershipLookup>,
        members: Arc<dyn MemberStore>,
        hasher: Arc<PasswordHasher>,
        config: AuthConfig,
    ) -> Self {
        Self {
            encoder,
            decoder,
            ledger,
            limiter,
            enforcer,
            users,
            tenants,
            memberships,
            members,
            hasher,
            validator: PasswordValidator::new(&config),
            config,
        }
    }

    /// Runs one storage-bound step under the configured deadline.
    async fn step<T, F>(&self, operation: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        with_timeout(self.config.operation_timeout(), operation, fut).await
    }

    /// Creates a user account.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<RegisteredUser> {
        validate_request(&req)?;
        let user = self.create_user(&normalize_email(&req.email), &req.password).await?;

        info!(user_id = %user.id, "User registered");

        Ok(RegisteredUser {
            user: summary(&user),
            created_at: user.created_at,
        })
    }

    /// Creates a tenant owned by a new or re-authenticated user and signs
    /// them in to it.
    ///
    /// An existing account goes through the same throttling and password
    /// check as `login`. A new account is created together with its tenant
    /// and owner membership in one transaction.
    pub async fn bootstrap(
        &self,
        req: BootstrapRequest,
        ctx: &RequestContext,
    ) -> AppResult<BootstrapResponse> {
        validate_request(&req)?;
        let email = normalize_email(&req.owner_email);
        let key = LoginRateKey::new(ctx.ip_or_unknown(), email.clone());
        self.ensure_not_blocked(&key).await?;

        let existing = self
            .step("find_login_user", self.users.find_login_user(&email))
            .await?;
        let tenant_name = req.tenant_name.trim();
        let (owner, tenant) = match existing {
            Some(user) => {
                let owner = self
                    .verify_credentials(&key, Some(user), &req.owner_password)
                    .await?;
                let (tenant, _) = self
                    .step(
                        "create_tenant_with_owner",
                        self.tenants.create_tenant_with_owner(tenant_name, owner.id),
                    )
                    .await?;
                (owner, tenant)
            }
            None => {
                let owner = self.new_user(&email, &req.owner_password)?;
                let (owner, tenant, _) = self
                    .step(
                        "bootstrap_owner",
                        self.tenants.bootstrap_owner(owner, tenant_name),
                    )
                    .await?;
                (owner, tenant)
            }
        };

        let refresh = self
            .step(
                "create_refresh_session",
                self.ledger.create(owner.id, self.config.refresh_ttl(), ctx),
            )
            .await?;
        let tokens = self.token_pair(owner.id, Some(tenant.id), refresh)?;

        info!(user_id = %owner.id, tenant_id = %tenant.id, "Tenant bootstrapped");

        Ok(BootstrapResponse {
            tenant: TenantSummary {
                id: tenant.id,
                name: tenant.name,
            },
            owner_user: summary(&owner),
            tokens,
        })
    }

    /// Password login.
    ///
    /// 1. Reject if the (client IP, email) bucket is over the limit
    /// 2. Look up the user and verify the password
    /// 3. On failure count the attempt; on success reset the counter
    /// 4. Check tenant membership when a tenant is requested
    /// 5. Create a refresh session and sign an access token
    pub async fn login(&self, req: LoginRequest, ctx: &RequestContext) -> AppResult<LoginResponse> {
        validate_request(&req)?;
        let email = normalize_email(&req.email);
        let key = LoginRateKey::new(ctx.ip_or_unknown(), email.clone());
        self.ensure_not_blocked(&key).await?;

        let user = self
            .step("find_login_user", self.users.find_login_user(&email))
            .await?;
        let user = self.verify_credentials(&key, user, &req.password).await?;

        if let Some(tenant_id) = req.tenant_id {
            let role = self
                .step(
                    "membership_lookup",
                    self.memberships.get_role(tenant_id, user.id),
                )
                .await?;
            if role.is_none() {
                warn!(user_id = %user.id, tenant_id = %tenant_id, "Login refused: not a tenant member");
                return Err(AppError::invalid_credential());
            }
        }

        let refresh = self
            .step(
                "create_refresh_session",
                self.ledger.create(user.id, self.config.refresh_ttl(), ctx),
            )
            .await?;
        let tokens = self.token_pair(user.id, req.tenant_id, refresh)?;

        info!(user_id = %user.id, tenant_id = ?req.tenant_id, "Login successful");

        Ok(LoginResponse {
            tokens,
            user: summary(&user),
            tenant_id: req.tenant_id,
        })
    }

    /// Exchanges a refresh token for a new pair. The access token is not
    /// tenant-bound.
    pub async fn refresh(
        &self,
        req: RefreshRequest,
        ctx: &RequestContext,
    ) -> AppResult<RefreshResponse> {
        validate_request(&req)?;
        self.ledger
            .validate_format(&req.refresh_token)
            .map_err(|_| AppError::invalid_credential())?;

        let rotated = self
            .step(
                "rotate_refresh_session",
                self.ledger
                    .rotate(&req.refresh_token, self.config.refresh_ttl()),
            )
            .await
            .inspect_err(|e| {
                if e.kind == ErrorKind::SessionRevoked {
                    warn!(
                        client_ip = ctx.ip_or_unknown(),
                        user_agent = ctx.user_agent.as_deref().unwrap_or("-"),
                        "Revoked refresh token presented; possible replay"
                    );
                }
            })?;

        let user_id = rotated.user_id;
        let tokens = self.token_pair(user_id, None, rotated)?;
        Ok(RefreshResponse { tokens, user_id })
    }

    /// Revokes the presented refresh token. Idempotent.
    pub async fn logout(&self, req: LogoutRequest) -> AppResult<LogoutResponse> {
        validate_request(&req)?;
        self.step(
            "revoke_refresh_session",
            self.ledger.revoke(&req.refresh_token),
        )
        .await?;
        Ok(LogoutResponse { ok: true })
    }

    /// Revokes every refresh session of the caller.
    pub async fn logout_all(&self, auth: &AuthContext) -> AppResult<LogoutAllResponse> {
        let revoked_count = self
            .step(
                "revoke_all_refresh_sessions",
                self.ledger.revoke_all(auth.user_id),
            )
            .await?;
        Ok(LogoutAllResponse {
            ok: true,
            revoked_count,
        })
    }

    /// Issues an access token bound to another tenant the caller belongs to.
    pub async fn switch_tenant(
        &self,
        auth: &AuthContext,
        req: SwitchTenantRequest,
    ) -> AppResult<SwitchTenantResponse> {
        let role = self
            .step(
                "membership_lookup",
                self.memberships.get_role(req.tenant_id, auth.user_id),
            )
            .await?;
        if role.is_none() {
            return Err(AppError::policy_denied("Not a member of the tenant"));
        }

        let access = self.encoder.issue(
            auth.user_id,
            Some(req.tenant_id),
            TokenType::Access,
            self.config.access_ttl(),
        )?;

        info!(user_id = %auth.user_id, tenant_id = %req.tenant_id, "Tenant switched");

        Ok(SwitchTenantResponse {
            access_token: access.token,
            expires_in: self.config.access_ttl().as_secs(),
            tenant_id: req.tenant_id,
        })
    }

    /// Verifies a bearer access token. Accepts the raw token or an
    /// `Authorization` header value.
    pub fn authenticate(&self, bearer: &str) -> AppResult<AuthContext> {
        let token = bearer.strip_prefix("Bearer ").unwrap_or(bearer).trim();
        let claims = self.decoder.verify_access(token)?;
        Ok(AuthContext {
            user_id: claims.user_id(),
            tenant_id: claims.tenant_id(),
        })
    }

    /// Requires that the caller may perform `action` on `resource` in
    /// `tenant_id`.
    pub async fn authorize(
        &self,
        auth: &AuthContext,
        tenant_id: Uuid,
        resource: &str,
        action: &str,
    ) -> AppResult<()> {
        let decision = self
            .enforcer
            .authorize_tenant_action(tenant_id, auth.user_id, resource, action)
            .await;
        if decision.is_allowed() {
            Ok(())
        } else {
            Err(AppError::policy_denied(format!(
                "'{action}' on '{resource}' is not permitted"
            )))
        }
    }

    /// Lists the members of a tenant.
    pub async fn list_members(
        &self,
        auth: &AuthContext,
        tenant_id: Uuid,
    ) -> AppResult<ListMembersResponse> {
        self.authorize(auth, tenant_id, MEMBERS_RESOURCE, "GET").await?;
        let members = self
            .step("list_members", self.members.list_members(tenant_id))
            .await?;
        Ok(ListMembersResponse {
            members: members.into_iter().map(MemberItem::from).collect(),
        })
    }

    /// Adds an existing account to a tenant.
    pub async fn add_member(
        &self,
        auth: &AuthContext,
        tenant_id: Uuid,
        req: AddMemberRequest,
    ) -> AppResult<MemberResponse> {
        self.authorize(auth, tenant_id, MEMBERS_RESOURCE, "POST").await?;
        let role = parse_member_role(&req.role)?;
        let membership = self
            .step(
                "add_member",
                self.members.insert_member(tenant_id, req.user_id, role),
            )
            .await
            .map_err(|e| match e.kind {
                ErrorKind::Conflict => e.with_details(json!({ "reason": "member_exists" })),
                ErrorKind::NotFound => e.with_details(json!({ "reason": "user_not_found" })),
                _ => e,
            })?;

        info!(
            actor_id = %auth.user_id,
            tenant_id = %tenant_id,
            user_id = %req.user_id,
            role = %role,
            "Tenant member added"
        );
        Ok(MemberResponse {
            tenant_id,
            user_id: membership.user_id,
            role: membership.role,
        })
    }

    /// Changes the role of an existing member.
    pub async fn update_member_role(
        &self,
        auth: &AuthContext,
        tenant_id: Uuid,
        user_id: Uuid,
        req: UpdateMemberRoleRequest,
    ) -> AppResult<MemberResponse> {
        self.authorize(auth, tenant_id, MEMBER_RESOURCE, "PATCH").await?;
        let role = parse_member_role(&req.role)?;
        let updated = self
            .step(
                "update_member_role",
                self.members.set_member_role(tenant_id, user_id, role),
            )
            .await?;
        if !updated {
            return Err(member_not_found(tenant_id, user_id));
        }

        info!(
            actor_id = %auth.user_id,
            tenant_id = %tenant_id,
            user_id = %user_id,
            role = %role,
            "Tenant member role changed"
        );
        Ok(MemberResponse {
            tenant_id,
            user_id,
            role: role.as_str().to_string(),
        })
    }

    /// Removes a member from a tenant.
    pub async fn remove_member(
        &self,
        auth: &AuthContext,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<MemberRemovedResponse> {
        self.authorize(auth, tenant_id, MEMBER_RESOURCE, "DELETE").await?;
        let removed = self
            .step(
                "remove_member",
                self.members.delete_member(tenant_id, user_id),
            )
            .await?;
        if !removed {
            return Err(member_not_found(tenant_id, user_id));
        }

        info!(
            actor_id = %auth.user_id,
            tenant_id = %tenant_id,
            user_id = %user_id,
            "Tenant member removed"
        );
        Ok(MemberRemovedResponse { ok: true })
    }

    /// The caller's roles in a tenant.
    pub async fn my_roles(&self, auth: &AuthContext, tenant_id: Uuid) -> AppResult<MyRolesResponse> {
        self.authorize(auth, tenant_id, MY_ROLES_RESOURCE, "GET").await?;
        let role = self
            .step(
                "membership_lookup",
                self.memberships.get_role(tenant_id, auth.user_id),
            )
            .await?;
        Ok(MyRolesResponse {
            tenant_id,
            roles: role.into_iter().collect(),
        })
    }

    async fn ensure_not_blocked(&self, key: &LoginRateKey) -> AppResult<()> {
        if self.limiter.is_blocked(key).await {
            warn!(client_ip = %key.client_ip, "Sign-in refused: too many failed attempts");
            return Err(AppError::rate_limited("Too many failed login attempts"));
        }
        Ok(())
    }

    /// Checks the password of a looked-up account. Failures are counted
    /// against `key`; success clears it.
    async fn verify_credentials(
        &self,
        key: &LoginRateKey,
        user: Option<User>,
        password: &str,
    ) -> AppResult<User> {
        let user = match user {
            Some(user) if user.can_login() => user,
            _ => return Err(self.login_failed(key).await),
        };
        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(self.login_failed(key).await);
        }
        self.limiter.clear(key).await;
        Ok(user)
    }

    fn new_user(&self, email: &str, password: &str) -> AppResult<NewUser> {
        self.validator.validate(password)?;
        Ok(NewUser {
            email: email.to_string(),
            password_hash: self.hasher.hash_password(password)?,
        })
    }

    async fn create_user(&self, email: &str, password: &str) -> AppResult<User> {
        let data = self.new_user(email, password)?;
        self.step("create_user", self.users.create_user(data)).await
    }

    async fn login_failed(&self, key: &LoginRateKey) -> AppError {
        self.limiter.record_failure(key).await;
        AppError::invalid_credential()
    }

    fn token_pair(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        refresh: IssuedRefreshToken,
    ) -> AppResult<TokenPair> {
        let access = self.encoder.issue(
            user_id,
            tenant_id,
            TokenType::Access,
            self.config.access_ttl(),
        )?;
        Ok(TokenPair {
            access_token: access.token,
            expires_in: self.config.access_ttl().as_secs(),
            refresh_token: refresh.token,
            refresh_expires_in: self.config.refresh_ttl().as_secs(),
        })
    }
}

fn member_not_found(tenant_id: Uuid, user_id: Uuid) -> AppError {
    AppError::not_found(format!("User {user_id} is not a member of tenant {tenant_id}"))
        .with_details(json!({ "reason": "member_not_found" }))
}

fn summary(user: &User) -> UserSummary {
    UserSummary {
        id: user.id,
        email: user.email.clone(),
    }
}
