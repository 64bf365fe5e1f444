//! Refresh session domain entities.

pub mod model;
pub mod rotation;
pub mod state;

pub use model::{NewRefreshSession, RefreshSession};
pub use rotation::{RotationOutcome, Successor};
pub use state::SessionState;
