//! Failed-login throttling keyed by client IP and email.

pub mod limiter;

pub use limiter::{LoginRateKey, LoginRateLimiter};
