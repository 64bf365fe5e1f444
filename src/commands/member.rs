//! Tenant member management, run on behalf of an acting member.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use tenantauth_auth::AuthContext;
use tenantauth_auth::session::dto::{AddMemberRequest, MemberItem, UpdateMemberRoleRequest};
use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;

use crate::output::Printer;

/// Arguments for member commands
#[derive(Debug, Args)]
pub struct MemberArgs {
    /// Tenant ID
    #[arg(long)]
    pub tenant: String,
    /// ID of the member performing the change; must hold a managing role
    #[arg(long)]
    pub actor: String,
    #[command(subcommand)]
    pub command: MemberCommand,
}

/// Member subcommands
#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// List the tenant's members
    List,
    /// Add an existing account to the tenant
    Add {
        /// User ID
        #[arg(long)]
        user: String,
        /// Role (owner, admin, member)
        #[arg(long, default_value = "member")]
        role: String,
    },
    /// Change a member's role
    SetRole {
        /// User ID
        #[arg(long)]
        user: String,
        /// Role (owner, admin, member)
        #[arg(long)]
        role: String,
    },
    /// Remove a member from the tenant
    Remove {
        /// User ID
        #[arg(long)]
        user: String,
    },
    /// Show the actor's own roles in the tenant
    Me,
}

#[derive(Debug, Serialize, Tabled)]
struct MemberRow {
    user_id: String,
    email: String,
    role: String,
    since: String,
}

impl From<MemberItem> for MemberRow {
    fn from(member: MemberItem) -> Self {
        Self {
            user_id: member.user_id.to_string(),
            email: member.email,
            role: member.role,
            since: member.created_at.to_rfc3339(),
        }
    }
}

/// Execute member commands
pub async fn execute(args: &MemberArgs, config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let tenant_id = super::parse_uuid("tenant", &args.tenant)?;
    let actor = AuthContext {
        user_id: super::parse_uuid("actor", &args.actor)?,
        tenant_id: Some(tenant_id),
    };

    let (engine, _db) = super::build_engine(config).await?;
    let sessions = &engine.sessions;

    match &args.command {
        MemberCommand::List => {
            let rows: Vec<MemberRow> = sessions
                .list_members(&actor, tenant_id)
                .await?
                .members
                .into_iter()
                .map(MemberRow::from)
                .collect();
            out.rows(&rows);
        }
        MemberCommand::Add { user, role } => {
            let user_id = super::parse_uuid("user", user)?;
            let added = sessions
                .add_member(&actor, tenant_id, AddMemberRequest {
                    user_id,
                    role: role.clone(),
                })
                .await?;
            out.done(&format!("{user_id} is now {} of {tenant_id}", added.role), &added);
        }
        MemberCommand::SetRole { user, role } => {
            let user_id = super::parse_uuid("user", user)?;
            let changed = sessions
                .update_member_role(&actor, tenant_id, user_id, UpdateMemberRoleRequest {
                    role: role.clone(),
                })
                .await?;
            out.done(&format!("{user_id} is now {} of {tenant_id}", changed.role), &changed);
        }
        MemberCommand::Remove { user } => {
            let user_id = super::parse_uuid("user", user)?;
            let removed = sessions.remove_member(&actor, tenant_id, user_id).await?;
            out.done(&format!("Removed {user_id} from {tenant_id}"), &removed);
        }
        MemberCommand::Me => {
            let roles = sessions.my_roles(&actor, tenant_id).await?;
            out.done(
                &format!("Roles in {tenant_id}: {}", roles.roles.join(", ")),
                &roles,
            );
        }
    }
    Ok(())
}
