//! Policy rule repository implementation.

use sqlx::PgPool;

use tenantauth_core::result::AppResult;
use tenantauth_entity::policy::PolicyRule;

use crate::error::map_sqlx_error;

/// Repository for `policy_rules`.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    pool: PgPool,
}

impl PolicyRepository {
    /// Create a new policy repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every rule, ordered for stable display.
    pub async fn find_all(&self) -> AppResult<Vec<PolicyRule>> {
        sqlx::query_as::<_, PolicyRule>(
            "SELECT subject, domain, resource, action FROM policy_rules \
             ORDER BY subject, domain, resource, action",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_policy_rules", e))
    }

    /// List the rules granted to one subject.
    pub async fn find_by_subject(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        sqlx::query_as::<_, PolicyRule>(
            "SELECT subject, domain, resource, action FROM policy_rules WHERE subject = $1",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_policy_rules_by_subject", e))
    }

    /// Insert a rule unless it already exists. Returns whether it was inserted.
    pub async fn insert(&self, rule: &PolicyRule) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO policy_rules (subject, domain, resource, action) \
             VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
        )
        .bind(&rule.subject)
        .bind(&rule.domain)
        .bind(&rule.resource)
        .bind(&rule.action)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_policy_rule", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert all missing rules in one transaction. Returns how many were new.
    pub async fn insert_many(&self, rules: &[PolicyRule]) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_policy_rules_begin", e))?;

        let mut inserted = 0;
        for rule in rules {
            let result = sqlx::query(
                "INSERT INTO policy_rules (subject, domain, resource, action) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
            )
            .bind(&rule.subject)
            .bind(&rule.domain)
            .bind(&rule.resource)
            .bind(&rule.action)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_policy_rules", e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_policy_rules_commit", e))?;
        Ok(inserted)
    }

    /// Delete one rule. Returns whether it existed.
    pub async fn delete(&self, rule: &PolicyRule) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM policy_rules \
             WHERE subject = $1 AND domain = $2 AND resource = $3 AND action = $4",
        )
        .bind(&rule.subject)
        .bind(&rule.domain)
        .bind(&rule.resource)
        .bind(&rule.action)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_policy_rule", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every rule of a subject. Returns the number removed.
    pub async fn delete_by_subject(&self, subject: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM policy_rules WHERE subject = $1")
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_policy_rules_by_subject", e))?;
        Ok(result.rows_affected())
    }
}
