//! # tenantauth-auth
//!
//! Multi-tenant authentication and authorization for TenantAuth.
//!
//! ## Modules
//!
//! - `jwt`: signed access token issuance and verification
//! - `password`: Argon2id password hashing and policy enforcement
//! - `session`: refresh session ledger and the login/refresh/logout flows
//! - `ratelimit`: failed-login throttling per client IP and email
//! - `rbac`: tenant role mapping and domain-scoped policy enforcement
//! - `directory`: user, tenant, and membership lookups
//! - `engine`: wiring of all components over Postgres or memory

pub mod directory;
pub mod engine;
pub mod jwt;
pub mod password;
pub mod ratelimit;
pub mod rbac;
pub mod session;
pub mod timeout;

pub use engine::AuthEngine;
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenError, TokenType};
pub use password::{PasswordHasher, PasswordValidator};
pub use ratelimit::{LoginRateKey, LoginRateLimiter};
pub use rbac::{Decision, PolicyEnforcer, PolicySubject};
pub use session::{AuthContext, RefreshLedger, RequestContext, SessionManager};
