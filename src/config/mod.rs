//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags (GlobalFlags)          environment (K6_LOG_OUTPUT, K6_CONFIG)
//!     → loader.rs (flag wins, env only fills unset flags, then defaults)
//!     → Settings (explicit value object, built once per process)
//!     → validation.rs (log output / remote descriptor parsing)
//!     → consumed by observability::logging and lifecycle::controller
//! ```
//!
//! # Design Decisions
//! - No global mutable flag state; `Settings` is passed by reference
//! - Env lookups are injected so resolution is a pure function
//! - Validation happens before any logging sink is bound

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config_path, resolve_settings, CONFIG_ENV, LOG_OUTPUT_ENV};
pub use schema::{GlobalFlags, LogConfig, LogFormat, LogOutput, RemoteConfig, Settings};
pub use validation::{parse_log_output, ConfigError};
