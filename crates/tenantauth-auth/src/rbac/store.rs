//! Policy rule persistence.

use async_trait::async_trait;
use sqlx::PgPool;

use tenantauth_core::result::AppResult;
use tenantauth_database::repositories::PolicyRepository;
use tenantauth_entity::policy::PolicyRule;

/// Storage for policy rules, unique over the four-tuple.
#[async_trait]
pub trait PolicyStore: Send + Sync + std::fmt::Debug {
    /// Every rule, in stable order.
    async fn list(&self) -> AppResult<Vec<PolicyRule>>;

    /// Rules granted to one subject.
    async fn for_subject(&self, subject: &str) -> AppResult<Vec<PolicyRule>>;

    /// Inserts a rule unless present. Returns whether it was inserted.
    async fn insert(&self, rule: &PolicyRule) -> AppResult<bool>;

    /// Inserts all missing rules. Returns how many were new.
    async fn insert_many(&self, rules: &[PolicyRule]) -> AppResult<u64>;

    /// Removes one rule. Returns whether it existed.
    async fn delete(&self, rule: &PolicyRule) -> AppResult<bool>;

    /// Removes every rule of a subject. Returns how many were removed.
    async fn delete_by_subject(&self, subject: &str) -> AppResult<u64>;
}

/// Postgres-backed policy store.
#[derive(Debug, Clone)]
pub struct PgPolicyStore {
    repo: PolicyRepository,
}

impl PgPolicyStore {
    /// Creates a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: PolicyRepository::new(pool),
        }
    }
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn list(&self) -> AppResult<Vec<PolicyRule>> {
        self.repo.find_all().await
    }

    async fn for_subject(&self, subject: &str) -> AppResult<Vec<PolicyRule>> {
        self.repo.find_by_subject(subject).await
    }

    async fn insert(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.repo.insert(rule).await
    }

    async fn insert_many(&self, rules: &[PolicyRule]) -> AppResult<u64> {
        self.repo.insert_many(rules).await
    }

    async fn delete(&self, rule: &PolicyRule) -> AppResult<bool> {
        self.repo.delete(rule).await
    }

    async fn delete_by_subject(&self, subject: &str) -> AppResult<u64> {
        self.repo.delete_by_subject(subject).await
    }
}
