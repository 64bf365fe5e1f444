//! User domain entities.

pub mod model;
pub mod status;

pub use model::{NewUser, User};
pub use status::UserStatus;
