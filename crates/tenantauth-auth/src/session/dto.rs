//! Request and response payloads for the session flows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tenantauth_core::error::{AppError, ErrorKind};
use tenantauth_core::result::AppResult;
use tenantauth_entity::tenant::{TenantMember, TenantRole};

/// Runs derive-based validation and maps failures to `Validation`.
pub fn validate_request<T: Validate>(req: &T) -> AppResult<()> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Parses a role supplied by a caller. Unknown roles are a `Validation`
/// failure here, unlike stored roles which surface as `InvalidRole`.
pub fn parse_member_role(raw: &str) -> AppResult<TenantRole> {
    raw.trim().to_lowercase().parse().map_err(|e: AppError| {
        AppError::new(ErrorKind::Validation, e.message)
            .with_details(serde_json::json!({ "reason": "invalid_argument" }))
    })
}

/// Register request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub email: String,
    /// Plaintext password, checked against the password policy.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Bootstrap request: first owner and their tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BootstrapRequest {
    /// Name of the tenant to create.
    #[validate(length(min = 1, max = 100, message = "Tenant name is required"))]
    pub tenant_name: String,
    /// Owner email; an existing account must present its password.
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub owner_email: String,
    /// Owner password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub owner_password: String,
}

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"), length(max = 255))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Tenant to bind the access token to.
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
}

/// Refresh request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    /// Opaque refresh token.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogoutRequest {
    /// Opaque refresh token to revoke.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Switch-tenant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchTenantRequest {
    /// Tenant to bind the new access token to.
    pub tenant_id: Uuid,
}

/// Add-member request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    /// Account to add.
    pub user_id: Uuid,
    /// One of `owner`, `admin`, `member`.
    pub role: String,
}

/// Update-member-role request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRoleRequest {
    /// One of `owner`, `admin`, `member`.
    pub role: String,
}

/// Access and refresh token pair. Lifetimes are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,
    /// Access token lifetime.
    pub expires_in: u64,
    /// Opaque refresh token.
    pub refresh_token: String,
    /// Refresh token lifetime.
    pub refresh_expires_in: u64,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// User id.
    pub id: Uuid,
    /// Email address.
    pub email: String,
}

/// Public view of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSummary {
    /// Tenant id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// A newly registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// The created user.
    pub user: UserSummary,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Bootstrap result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResponse {
    /// The created tenant.
    pub tenant: TenantSummary,
    /// The owner account.
    pub owner_user: UserSummary,
    /// Tokens bound to the new tenant.
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Login result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Issued tokens.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: UserSummary,
    /// Tenant the access token is bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
}

/// Refresh result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Issued tokens; the access token is not tenant-bound.
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// Owner of the rotated session.
    pub user_id: Uuid,
}

/// Logout result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Always true; logout is idempotent.
    pub ok: bool,
}

/// Logout-all result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogoutAllResponse {
    /// Always true.
    pub ok: bool,
    /// Sessions revoked by this call.
    pub revoked_count: u64,
}

/// Switch-tenant result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchTenantResponse {
    /// Access token bound to `tenant_id`.
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// The selected tenant.
    pub tenant_id: Uuid,
}

/// One tenant member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberItem {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<TenantMember> for MemberItem {
    fn from(member: TenantMember) -> Self {
        Self {
            user_id: member.user_id,
            email: member.email,
            role: member.role,
            created_at: member.created_at,
        }
    }
}

/// Member listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMembersResponse {
    /// Oldest membership first.
    pub members: Vec<MemberItem>,
}

/// A membership after it was added or changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
}

/// Remove-member result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemberRemovedResponse {
    /// Always true; a missing membership is reported as `NotFound`.
    pub ok: bool,
}

/// The caller's roles in one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyRolesResponse {
    pub tenant_id: Uuid,
    pub roles: Vec<String>,
}
