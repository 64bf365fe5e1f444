//! Tenant-scoped access check command.

use clap::Args;
use serde_json::json;

use tenantauth_auth::rbac::{Decision, domain_for_tenant};
use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;

use crate::output::Printer;

/// Arguments for the check-access command
#[derive(Debug, Args)]
pub struct CheckAccessArgs {
    /// Tenant ID
    #[arg(long)]
    pub tenant: String,
    /// User ID
    #[arg(long)]
    pub user: String,
    /// Resource path, e.g. `/v1/admin/users`
    #[arg(long)]
    pub resource: String,
    /// Action, e.g. `GET`
    #[arg(long)]
    pub action: String,
}

/// Resolve the user's role in the tenant and evaluate the rules
pub async fn execute(
    args: &CheckAccessArgs,
    config: &AppConfig,
    out: Printer,
) -> Result<(), AppError> {
    let tenant_id = super::parse_uuid("tenant", &args.tenant)?;
    let user_id = super::parse_uuid("user", &args.user)?;
    let (engine, _db) = super::build_engine(config).await?;

    let decision = engine
        .policies
        .authorize_tenant_action(tenant_id, user_id, &args.resource, &args.action)
        .await;

    let domain = domain_for_tenant(tenant_id);
    let line = format!("{decision:?}: {} {} in {domain}", args.action, args.resource);
    let payload = json!({
        "domain": domain,
        "resource": args.resource,
        "action": args.action,
        "decision": decision,
    });

    match decision {
        Decision::Allow => out.done(&line, &payload),
        Decision::Deny => out.unchanged(&line, &payload),
    }
    Ok(())
}
