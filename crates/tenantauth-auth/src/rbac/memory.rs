//! In-memory policy store.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tenantauth_core::result::AppResult;
use tenantauth_entity::policy::PolicyRule;

use super::store::PolicyStore;

type RuleKey = (String, String, String, String);

fn key(rule: &PolicyRule) -> RuleKey {
    (
        rule.subject.clone(),
        rule.domain.clone(),
        rule.resource.clone(),
        rule.action.clone(),
    )
}

fn rule((subject, domain, resource, action): &RuleKey) -> PolicyRule {
    PolicyRule::new(subject, domain, resource, action)
}

/// Policy rules held in process memory, ordered like the Postgres listing.
#[derive(Debug, Clone, Default)]
pub struct MemoryPolicyStore {
    rules: Arc<RwLock<BTreeSet<RuleKey>>>,
}

impl MemoryPolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn list(&self) -> AppResult<Vec<PolicyRule>> {
        Ok(self.rules.read().await.iter().map(rule).collect())
    }

    async fn for_subject(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        Ok(self
            .rules
            .read()
            .await
            .iter()
            .filter(|k| k.0 == subject)
            .map(rule)
            .collect())
    }

    async fn insert(&self, rule: &PolicyRule) -> AppResult<bool> {
        Ok(self.rules.write().await.insert(key(rule)))
    }

    async fn insert_many(&self, rules: &[PolicyRule]) -> AppResult<u64> {
        let mut set = self.rules.write().await;
        Ok(rules.iter().filter(|r| set.insert(key(r))).count() as u64)
    }

    async fn delete(&self, rule: &PolicyRule) -> AppResult<bool> {
        Ok(self.rules.write().await.remove(&key(rule)))
    }

    async fn delete_by_subject(&self, subject: &str) -> AppResult<u64> {
        let mut set = self.rules.write().await;
        let before = set.len();
        set.retain(|k| k.0 != subject);
        Ok((before - set.len()) as u64)
    }
}
