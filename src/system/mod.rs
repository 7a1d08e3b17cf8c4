//! Leaf adapters over the host: subprocess execution and service queries.

pub mod query;
pub mod runner;
pub mod sc;

pub use query::{Presence, ServiceState, SystemQuery};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
