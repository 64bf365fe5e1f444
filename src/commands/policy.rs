//! Policy rule management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;

use tenantauth_auth::rbac::PolicySubject;
use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;
use tenantauth_entity::policy::PolicyRule;

use crate::output::Printer;

/// Arguments for policy commands
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy subcommand
    #[command(subcommand)]
    pub command: PolicyCommand,
}

/// Policy subcommands
#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// List every rule
    List,
    /// Add a rule
    Add(RuleArgs),
    /// Remove a rule
    Remove(RuleArgs),
    /// Remove every rule of a subject
    RemoveSubject {
        /// Policy subject (tenant_owner, tenant_admin, member)
        #[arg(long)]
        subject: String,
    },
}

/// One rule, given as four flags
#[derive(Debug, Args)]
pub struct RuleArgs {
    /// Policy subject (tenant_owner, tenant_admin, member)
    #[arg(long)]
    pub subject: String,
    /// Domain pattern, e.g. `tenant:*`
    #[arg(long)]
    pub domain: String,
    /// Resource pattern, e.g. `/v1/admin/*`
    #[arg(long)]
    pub resource: String,
    /// Action or `*`
    #[arg(long)]
    pub action: String,
}

impl From<&RuleArgs> for PolicyRule {
    fn from(args: &RuleArgs) -> Self {
        PolicyRule::new(&args.subject, &args.domain, &args.resource, &args.action)
    }
}

/// Policy rule display row
#[derive(Debug, Serialize, Tabled)]
struct PolicyRow {
    /// Subject
    subject: String,
    /// Domain
    domain: String,
    /// Resource
    resource: String,
    /// Action
    action: String,
}

impl From<PolicyRule> for PolicyRow {
    fn from(rule: PolicyRule) -> Self {
        Self {
            subject: rule.subject,
            domain: rule.domain,
            resource: rule.resource,
            action: rule.action,
        }
    }
}

/// Insert the default rules
pub async fn seed(config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let (engine, _db) = super::build_engine(config).await?;
    let inserted = engine.policies.seed_defaults().await?;
    let payload = json!({ "inserted": inserted });
    if inserted {
        out.done("Default policy rules seeded", &payload);
    } else {
        out.unchanged("Default policy rules already present", &payload);
    }
    Ok(())
}

/// Execute policy commands
pub async fn execute(args: &PolicyArgs, config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let (engine, _db) = super::build_engine(config).await?;

    match &args.command {
        PolicyCommand::List => {
            let rows: Vec<PolicyRow> = engine
                .policies
                .list_rules()
                .await?
                .into_iter()
                .map(PolicyRow::from)
                .collect();
            out.rows(&rows);
        }
        PolicyCommand::Add(rule_args) => {
            let rule = PolicyRule::from(rule_args);
            let added = engine.policies.add_rule(&rule).await?;
            let payload = json!({ "added": added });
            if added {
                out.done(&format!("Added rule: {rule}"), &payload);
            } else {
                out.unchanged(&format!("Rule already exists: {rule}"), &payload);
            }
        }
        PolicyCommand::Remove(rule_args) => {
            let rule = PolicyRule::from(rule_args);
            let removed = engine.policies.remove_rule(&rule).await?;
            let payload = json!({ "removed": removed });
            if removed {
                out.done(&format!("Removed rule: {rule}"), &payload);
            } else {
                out.unchanged(&format!("No such rule: {rule}"), &payload);
            }
        }
        PolicyCommand::RemoveSubject { subject } => {
            let subject: PolicySubject = subject.parse()?;
            let removed = engine.policies.remove_rules_for_subject(subject).await?;
            out.done(
                &format!("Removed {removed} rules for {subject}"),
                &json!({ "removed": removed }),
            );
        }
    }

    Ok(())
}
