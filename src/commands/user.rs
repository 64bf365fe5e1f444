//! Account status command.

use clap::Args;
use serde_json::json;

use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;
use tenantauth_database::repositories::UserRepository;
use tenantauth_entity::user::{UserStatus, model::normalize_email};

use crate::output::Printer;

/// Arguments for the user-status command
#[derive(Debug, Args)]
pub struct UserStatusArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
    /// New status (active, disabled)
    #[arg(long)]
    pub status: String,
}

/// Enable or disable sign-in for an account
///
/// Disabling does not revoke refresh sessions; follow with
/// `session revoke` to end them.
pub async fn execute(args: &UserStatusArgs, config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let status: UserStatus = args.status.parse()?;
    let db = super::connect_database(config).await?;
    let users = UserRepository::new(db.pool().clone());

    let email = normalize_email(&args.email);
    let user = users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No user with email '{email}'")))?;

    users.set_status(user.id, status).await?;
    out.done(
        &format!("{email} is now {status}"),
        &json!({ "user_id": user.id, "status": status }),
    );
    Ok(())
}
