//! Policy enforcement over tenant domains.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tenantauth_core::error::AppError;
use tenantauth_core::result::AppResult;
use tenantauth_entity::policy::PolicyRule;

use crate::directory::MembershipLookup;
use crate::timeout::with_timeout;

use super::matcher::rule_matches;
use super::role::{PolicySubject, map_role};
use super::seed::default_rules;
use super::store::PolicyStore;

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// A rule grants the request.
    Allow,
    /// No rule grants the request.
    Deny,
}

impl Decision {
    /// Whether the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Policy domain for a tenant.
pub fn domain_for_tenant(tenant_id: Uuid) -> String {
    format!("tenant:{tenant_id}")
}

/// Evaluates requests against stored allow rules. Deny by default.
#[derive(Debug, Clone)]
pub struct PolicyEnforcer {
    store: Arc<dyn PolicyStore>,
    memberships: Arc<dyn MembershipLookup>,
    op_timeout: Duration,
}

impl PolicyEnforcer {
    /// Creates an enforcer over a rule store and membership lookup.
    pub fn new(
        store: Arc<dyn PolicyStore>,
        memberships: Arc<dyn MembershipLookup>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            store,
            memberships,
            op_timeout,
        }
    }

    /// Checks whether `subject` may perform `action` on `resource` in
    /// `domain`. Storage failures are errors, not decisions.
    pub async fn enforce(
        &self,
        subject: PolicySubject,
        domain: &str,
        resource: &str,
        action: &str,
    ) -> AppResult<Decision> {
        let rules = with_timeout(
            self.op_timeout,
            "policy_rules_for_subject",
            self.store.for_subject(subject.as_str()),
        )
        .await?;

        let allowed = rules
            .iter()
            .any(|rule| rule_matches(rule, subject.as_str(), domain, resource, action));

        Ok(if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        })
    }

    /// Resolves the caller's tenant role and enforces on `tenant:{id}`.
    ///
    /// Any failure along the way is a `Deny`.
    pub async fn authorize_tenant_action(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> Decision {
        match self.try_authorize(tenant_id, user_id, resource, action).await {
            Ok(decision) => {
                debug!(
                    tenant_id = %tenant_id,
                    user_id = %user_id,
                    resource,
                    action,
                    ?decision,
                    "Policy evaluated"
                );
                decision
            }
            Err(e) => {
                warn!(
                    tenant_id = %tenant_id,
                    user_id = %user_id,
                    resource,
                    action,
                    error = %e,
                    "Policy evaluation failed; denying"
                );
                Decision::Deny
            }
        }
    }

    async fn try_authorize(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        resource: &str,
        action: &str,
    ) -> AppResult<Decision> {
        let role = with_timeout(
            self.op_timeout,
            "membership_lookup",
            self.memberships.get_role(tenant_id, user_id),
        )
        .await?
        .ok_or_else(|| AppError::policy_denied("User is not a member of the tenant"))?;

        let subject = map_role(&role)?;
        self.enforce(subject, &domain_for_tenant(tenant_id), resource, action)
            .await
    }

    /// Ensures the default rules exist. Returns whether anything was added.
    pub async fn seed_defaults(&self) -> AppResult<bool> {
        let rules = default_rules();
        let inserted = with_timeout(
            self.op_timeout,
            "seed_policy_rules",
            self.store.insert_many(&rules),
        )
        .await?;
        if inserted > 0 {
            info!(inserted, "Default policy rules seeded");
        }
        Ok(inserted > 0)
    }

    /// Adds a rule. Returns whether it was new.
    pub async fn add_rule(&self, rule: &PolicyRule) -> AppResult<bool> {
        validate_rule(rule)?;
        let inserted =
            with_timeout(self.op_timeout, "insert_policy_rule", self.store.insert(rule)).await?;
        if inserted {
            info!(rule = %rule, "Policy rule added");
        }
        Ok(inserted)
    }

    /// Removes a rule. Returns whether it existed.
    pub async fn remove_rule(&self, rule: &PolicyRule) -> AppResult<bool> {
        let removed =
            with_timeout(self.op_timeout, "delete_policy_rule", self.store.delete(rule)).await?;
        if removed {
            info!(rule = %rule, "Policy rule removed");
        }
        Ok(removed)
    }

    /// Removes every rule of a subject. Returns how many were removed.
    pub async fn remove_rules_for_subject(&self, subject: PolicySubject) -> AppResult<u64> {
        let removed = with_timeout(
            self.op_timeout,
            "delete_policy_rules_by_subject",
            self.store.delete_by_subject(subject.as_str()),
        )
        .await?;
        info!(subject = %subject, removed, "Policy rules removed for subject");
        Ok(removed)
    }

    /// Lists every rule.
    pub async fn list_rules(&self) -> AppResult<Vec<PolicyRule>> {
        with_timeout(self.op_timeout, "list_policy_rules", self.store.list()).await
    }
}

fn validate_rule(rule: &PolicyRule) -> AppResult<()> {
    rule.subject.parse::<PolicySubject>()?;
    for (field, value) in [
        ("domain", &rule.domain),
        ("resource", &rule.resource),
        ("action", &rule.action),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Policy rule {field} must not be empty"
            )));
        }
    }
    Ok(())
}
