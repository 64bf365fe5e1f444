//! Schema migration command.

use serde_json::json;

use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;

use crate::output::Printer;

/// Apply pending migrations
pub async fn execute(config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let db = super::connect_database(config).await?;
    let result = tenantauth_database::migration::run_migrations(db.pool()).await;
    db.close().await;
    result?;
    out.done("Schema is up to date", &json!({ "migrated": true }));
    Ok(())
}
