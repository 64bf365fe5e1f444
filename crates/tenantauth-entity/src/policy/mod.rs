//! Policy rule entities.

pub mod rule;

pub use rule::PolicyRule;
