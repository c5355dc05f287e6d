//! Process-wide plumbing shared by the operator crates: logging setup and the
//! shutdown signal the operator loop listens on.

pub mod logging;
pub mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
