//! Seams implemented outside `tenantauth-core`.

pub mod counter;

pub use counter::CounterStore;
