//! Tenant membership entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's membership in a tenant.
///
/// `role` is kept as stored text; it is parsed into [`super::TenantRole`]
/// at the point of use so that unexpected values surface as an error
/// instead of a failed row decode.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantMembership {
    /// The tenant.
    pub tenant_id: Uuid,
    /// The member.
    pub user_id: Uuid,
    /// Stored role string (`owner`, `admin`, `member`).
    pub role: String,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

/// A membership joined with the member's email, as listed to tenant
/// managers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TenantMember {
    /// The member.
    pub user_id: Uuid,
    /// The member's email.
    pub email: String,
    /// Stored role string.
    pub role: String,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}
