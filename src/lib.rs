//! k6 command core.
//!
//! Extension module registry plus the setup and shutdown orchestration that
//! wraps every command: logging sink selection, command execution, and the
//! ordered drain of remote log delivery before exit.

pub mod config;
pub mod lifecycle;
pub mod modules;
pub mod observability;

pub use config::{GlobalFlags, Settings};
pub use lifecycle::{ExitCode, LifecycleController, Outcome};
pub use modules::{get_module, register_module, ModuleRegistry};
