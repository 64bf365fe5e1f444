//! CLI command definitions and dispatch.

pub mod access;
pub mod health;
pub mod member;
pub mod migrate;
pub mod policy;
pub mod session;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use tenantauth_auth::AuthEngine;
use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;
use tenantauth_core::traits::CounterStore;
use tenantauth_database::DatabasePool;

use crate::output::{OutputFormat, Printer};

/// TenantAuth administration
#[derive(Debug, Parser)]
#[command(name = "tenantauth", version, about, long_about = None)]
pub struct Cli {
    /// Configuration overlay to load (`config/{env}.toml`)
    #[arg(short, long, env = "TENANTAUTH_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Insert the default policy rules if missing
    SeedPolicies,
    /// Policy rule management
    Policy(policy::PolicyArgs),
    /// Evaluate a tenant-scoped access request
    CheckAccess(access::CheckAccessArgs),
    /// Refresh session inspection and revocation
    Session(session::SessionArgs),
    /// Enable or disable sign-in for an account
    UserStatus(user::UserStatusArgs),
    /// Tenant member management on behalf of a managing member
    Member(member::MemberArgs),
    /// Check database and counter store connectivity
    Health,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        let out = Printer::new(self.format);
        match &self.command {
            Commands::Migrate => migrate::execute(&config, out).await,
            Commands::SeedPolicies => policy::seed(&config, out).await,
            Commands::Policy(args) => policy::execute(args, &config, out).await,
            Commands::CheckAccess(args) => access::execute(args, &config, out).await,
            Commands::Session(args) => session::execute(args, &config, out).await,
            Commands::UserStatus(args) => user::execute(args, &config, out).await,
            Commands::Member(args) => member::execute(args, &config, out).await,
            Commands::Health => health::execute(&config, out).await,
        }
    }
}

/// Helper: connect to the configured database
pub async fn connect_database(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: build the configured counter store, if any
pub async fn connect_counters(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CounterStore>>, AppError> {
    tenantauth_cache::backend::connect(&config.counters).await
}

/// Helper: wire the engine over Postgres and the configured counter store
pub async fn build_engine(config: &AppConfig) -> Result<(AuthEngine, DatabasePool), AppError> {
    let db = connect_database(config).await?;
    let counters = connect_counters(config).await?;
    let engine = AuthEngine::with_postgres(
        &config.auth,
        &config.rate_limit,
        db.pool().clone(),
        counters,
    )?;
    Ok((engine, db))
}

/// Helper: parse a UUID argument
pub fn parse_uuid(field: &str, raw: &str) -> Result<uuid::Uuid, AppError> {
    uuid::Uuid::parse_str(raw)
        .map_err(|e| AppError::validation(format!("Invalid {field} UUID '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_access() {
        let cli = Cli::try_parse_from([
            "tenantauth",
            "--format",
            "json",
            "check-access",
            "--tenant",
            "7f1c1c4e-8a7e-4a53-9a55-3f3d0b9c1a10",
            "--user",
            "0b6f2f0a-5f43-4a40-9a0e-8a3a1f0a2b11",
            "--resource",
            "/v1/admin/users",
            "--action",
            "GET",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::CheckAccess(_)));
    }

    #[test]
    fn test_parse_session_revoke() {
        let cli = Cli::try_parse_from([
            "tenantauth",
            "session",
            "revoke",
            "--user",
            "0b6f2f0a-5f43-4a40-9a0e-8a3a1f0a2b11",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session(session::SessionArgs {
                command: session::SessionCommand::Revoke { .. }
            })
        ));
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn test_member_add_defaults_to_member_role() {
        let cli = Cli::try_parse_from([
            "tenantauth",
            "member",
            "--tenant",
            "7f1c1c4e-8a7e-4a53-9a55-3f3d0b9c1a10",
            "--actor",
            "5d2b8e71-3c1f-4f0e-8a57-2b9d6c4e7a01",
            "add",
            "--user",
            "0b6f2f0a-5f43-4a40-9a0e-8a3a1f0a2b11",
        ])
        .unwrap();
        match cli.command {
            Commands::Member(member::MemberArgs {
                command: member::MemberCommand::Add { role, .. },
                ..
            }) => assert_eq!(role, "member"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_member_commands_need_an_actor() {
        let result = Cli::try_parse_from([
            "tenantauth",
            "member",
            "--tenant",
            "7f1c1c4e-8a7e-4a53-9a55-3f3d0b9c1a10",
            "list",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_uuid() {
        assert!(parse_uuid("user", "not-a-uuid").is_err());
        assert!(parse_uuid("user", "0b6f2f0a-5f43-4a40-9a0e-8a3a1f0a2b11").is_ok());
    }
}
