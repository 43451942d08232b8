//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! INIT      root context created → LogSinkConfigurator → is_remote recorded
//! RUNNING   command tree executes with a child of the root context
//! SUCCESS / FAILURE
//!           error → exit status (structured ExitCode or -1) + hint field
//! DRAINING  (remote sink only) cancel root → wait for delivery signal
//! TERMINATED
//!           exit status handed back to main
//! ```
//!
//! # Design Decisions
//! - Cancellation is one-directional and sticky
//! - The drain wait has no timeout: remote log lines are never dropped on exit,
//!   at the cost of hanging on a delivery worker that never finishes
//! - Setup failures take the same exit path as command failures

pub mod context;
pub mod controller;
pub mod exit;

pub use context::RootContext;
pub use controller::{CommandContext, LifecycleController, Outcome, Phase};
pub use exit::{exit_status, CommandError, CommandResult, ExitCode, GENERIC_FAILURE};
