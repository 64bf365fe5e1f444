//! Repository implementations for the TenantAuth tables.

pub mod policy;
pub mod refresh_session;
pub mod tenant;
pub mod user;

pub use policy::PolicyRepository;
pub use refresh_session::RefreshSessionRepository;
pub use tenant::TenantRepository;
pub use user::UserRepository;
