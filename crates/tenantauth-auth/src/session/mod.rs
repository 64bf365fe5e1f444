//! Refresh session ledger and the credential exchange flows built on it.

pub mod context;
pub mod dto;
pub mod ledger;
pub mod manager;
pub mod memory;
pub mod store;
pub mod token;

pub use context::{AuthContext, RequestContext};
pub use ledger::{IssuedRefreshToken, RefreshLedger};
pub use manager::SessionManager;
pub use memory::MemoryRefreshSessionStore;
pub use store::{PgRefreshSessionStore, RefreshSessionStore};
