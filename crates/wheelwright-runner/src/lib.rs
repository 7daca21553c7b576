pub mod cleanup;
pub mod orchestrator;
pub mod runner;

pub use orchestrator::{BuildSummary, HostInvocation, Outcome};
pub use runner::{CommandRunner, ProcessRunner, RunStatus};
