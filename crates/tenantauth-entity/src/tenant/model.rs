//! Tenant row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An isolated customer scope. Policy domains are derived from the id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    /// Unique tenant identifier.
    pub id: Uuid,
    /// Free-form display name; not unique.
    pub name: String,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
}
