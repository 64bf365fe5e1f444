//! Refresh session inspection and revocation.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;

use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;
use tenantauth_database::repositories::RefreshSessionRepository;
use tenantauth_entity::refresh_session::RefreshSession;

use crate::output::Printer;

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List a user's refresh sessions that can still be exchanged
    List {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// Revoke every active refresh session of a user
    Revoke {
        /// User ID
        #[arg(long)]
        user: String,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    id: String,
    created_at: String,
    expires_at: String,
    client_ip: String,
    user_agent: String,
}

impl From<RefreshSession> for SessionRow {
    fn from(session: RefreshSession) -> Self {
        Self {
            id: session.id.to_string(),
            created_at: session.created_at.to_rfc3339(),
            expires_at: session.expires_at.to_rfc3339(),
            client_ip: session.client_ip.unwrap_or_else(|| "-".into()),
            user_agent: session.user_agent.unwrap_or_else(|| "-".into()),
        }
    }
}

/// Execute session commands
pub async fn execute(args: &SessionArgs, config: &AppConfig, out: Printer) -> Result<(), AppError> {
    match &args.command {
        SessionCommand::List { user } => {
            let user_id = super::parse_uuid("user", user)?;
            let db = super::connect_database(config).await?;
            let rows: Vec<SessionRow> = RefreshSessionRepository::new(db.pool().clone())
                .find_active_by_user(user_id)
                .await?
                .into_iter()
                .map(SessionRow::from)
                .collect();
            out.rows(&rows);
        }
        SessionCommand::Revoke { user } => {
            let user_id = super::parse_uuid("user", user)?;
            let (engine, _db) = super::build_engine(config).await?;
            let revoked = engine.ledger.revoke_all(user_id).await?;
            out.done(
                &format!("Revoked {revoked} sessions for user {user_id}"),
                &json!({ "user_id": user_id, "revoked_count": revoked }),
            );
        }
    }
    Ok(())
}
