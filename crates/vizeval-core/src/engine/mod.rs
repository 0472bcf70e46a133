//! Worker coordination: bounded-parallel dispatch of per-test pipeline runs
//! with per-group context reuse.

mod context;
mod coordinator;

pub use context::{ContextLease, ContextPool};
pub use coordinator::Coordinator;
