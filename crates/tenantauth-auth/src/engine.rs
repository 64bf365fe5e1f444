//! Component wiring over Postgres or in-memory backends.

use std::sync::Arc;

use sqlx::PgPool;

use tenantauth_cache::MemoryCounterStore;
use tenantauth_core::config::{AuthConfig, RateLimitConfig};
use tenantauth_core::result::AppResult;
use tenantauth_core::traits::CounterStore;

use crate::directory::{
    MemberStore, MemoryDirectory, MembershipLookup, PgDirectory, TenantStore, UserStore,
};
use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::password::PasswordHasher;
use crate::ratelimit::LoginRateLimiter;
use crate::rbac::{MemoryPolicyStore, PgPolicyStore, PolicyEnforcer, PolicyStore};
use crate::session::{
    MemoryRefreshSessionStore, PgRefreshSessionStore, RefreshLedger, RefreshSessionStore,
    SessionManager,
};

/// Storage collaborators of the engine.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Refresh session table.
    pub refresh_sessions: Arc<dyn RefreshSessionStore>,
    /// Policy rules.
    pub policies: Arc<dyn PolicyStore>,
    /// Credential store.
    pub users: Arc<dyn UserStore>,
    /// Tenant creation.
    pub tenants: Arc<dyn TenantStore>,
    /// Membership lookup.
    pub memberships: Arc<dyn MembershipLookup>,
    /// Membership management.
    pub members: Arc<dyn MemberStore>,
    /// Counter store for login throttling; `None` disables it.
    pub counters: Option<Arc<dyn CounterStore>>,
}

impl Backends {
    /// Postgres tables plus the given counter store.
    pub fn postgres(pool: PgPool, counters: Option<Arc<dyn CounterStore>>) -> Self {
        let directory = Arc::new(PgDirectory::new(pool.clone()));
        Self {
            refresh_sessions: Arc::new(PgRefreshSessionStore::new(pool.clone())),
            policies: Arc::new(PgPolicyStore::new(pool)),
            users: directory.clone(),
            tenants: directory.clone(),
            memberships: directory.clone(),
            members: directory,
            counters,
        }
    }

    /// Everything in process memory, sharing `directory` with the caller.
    pub fn memory(directory: &MemoryDirectory) -> Self {
        let directory = Arc::new(directory.clone());
        Self {
            refresh_sessions: Arc::new(MemoryRefreshSessionStore::new()),
            policies: Arc::new(MemoryPolicyStore::new()),
            users: directory.clone(),
            tenants: directory.clone(),
            memberships: directory.clone(),
            members: directory,
            counters: Some(Arc::new(MemoryCounterStore::default())),
        }
    }
}

/// The assembled authentication and authorization engine.
#[derive(Debug, Clone)]
pub struct AuthEngine {
    /// Credential exchange flows.
    pub sessions: SessionManager,
    /// Tenant policy enforcement and rule management.
    pub policies: PolicyEnforcer,
    /// Refresh session ledger.
    pub ledger: RefreshLedger,
    /// Failed-login throttling.
    pub limiter: LoginRateLimiter,
}

impl AuthEngine {
    /// Wires every component over `backends`.
    pub fn new(
        auth: &AuthConfig,
        rate_limit: &RateLimitConfig,
        backends: Backends,
    ) -> AppResult<Self> {
        auth.validate()?;
        rate_limit.validate()?;

        let op_timeout = auth.operation_timeout();
        let ledger = RefreshLedger::new(backends.refresh_sessions, auth.refresh_token_bytes);
        let limiter = LoginRateLimiter::new(backends.counters, rate_limit, op_timeout);
        let policies = PolicyEnforcer::new(
            backends.policies,
            backends.memberships.clone(),
            op_timeout,
        );

        let sessions = SessionManager::new(
            Arc::new(JwtEncoder::new(auth)?),
            Arc::new(JwtDecoder::new(auth)?),
            ledger.clone(),
            limiter.clone(),
            policies.clone(),
            backends.users,
            backends.tenants,
            backends.memberships,
            backends.members,
            Arc::new(PasswordHasher::new(auth)?),
            auth.clone(),
        );

        Ok(Self {
            sessions,
            policies,
            ledger,
            limiter,
        })
    }

    /// Engine over Postgres tables.
    pub fn with_postgres(
        auth: &AuthConfig,
        rate_limit: &RateLimitConfig,
        pool: PgPool,
        counters: Option<Arc<dyn CounterStore>>,
    ) -> AppResult<Self> {
        Self::new(auth, rate_limit, Backends::postgres(pool, counters))
    }

    /// Engine held entirely in memory. The returned directory lets callers
    /// seed memberships and change account status.
    pub fn in_memory(
        auth: &AuthConfig,
        rate_limit: &RateLimitConfig,
    ) -> AppResult<(Self, MemoryDirectory)> {
        let directory = MemoryDirectory::new();
        let engine = Self::new(auth, rate_limit, Backends::memory(&directory))?;
        Ok((engine, directory))
    }
}
