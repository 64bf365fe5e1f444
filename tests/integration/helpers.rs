//! Shared helpers for the Postgres integration tests.
//!
//! Every test connects to `TEST_DATABASE_URL` and returns early when it is
//! unset. Tests isolate themselves with fresh UUIDs and emails instead of
//! truncating tables, so they can run in parallel against one database.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use tenantauth_auth::AuthEngine;
use tenantauth_cache::MemoryCounterStore;
use tenantauth_core::config::{AuthConfig, RateLimitConfig};
use tenantauth_database::repositories::UserRepository;
use tenantauth_entity::user::NewUser;

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "integration-password";

/// Connected, migrated test database.
pub struct TestDb {
    /// Database pool for direct queries
    pub pool: PgPool,
}

impl TestDb {
    /// Connect and migrate, or `None` when no test database is configured.
    pub async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping Postgres integration test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");

        tenantauth_database::migration::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self { pool })
    }

    /// Insert a user with a placeholder hash and return its id.
    pub async fn create_user(&self) -> Uuid {
        UserRepository::new(self.pool.clone())
            .create(&NewUser {
                email: unique_email("ledger"),
                password_hash: "$argon2id$placeholder".to_string(),
            })
            .await
            .expect("Failed to create user")
            .id
    }

    /// Engine over this database with an in-memory counter store.
    pub fn engine(&self) -> AuthEngine {
        let counters = Arc::new(MemoryCounterStore::default());
        AuthEngine::with_postgres(
            &auth_config(),
            &RateLimitConfig::default(),
            self.pool.clone(),
            Some(counters),
        )
        .expect("Failed to build engine")
    }
}

/// Auth configuration with a cheap hash cost.
pub fn auth_config() -> AuthConfig {
    let mut config = AuthConfig::for_secret("tenantauth", "tenantauth-api", "integration-secret");
    config.password_hash_cost = 1;
    config
}

/// An email no other test uses.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@it.test", Uuid::new_v4().simple())
}
