//! Extension module registry.
//!
//! # Data Flow
//! ```text
//! extension crate (startup)
//!     → register_module("foo", handle)
//!     → name normalised to "k6/x/foo"
//!     → inserted once into the process-wide ModuleRegistry
//!
//! script resolution (later, any thread)
//!     → get_module("k6/x/foo")
//!     → Some(handle) | None
//! ```
//!
//! # Design Decisions
//! - Append-only: entries are never removed for the life of the process
//! - Duplicate registration is a programming error and panics
//! - Handles are shared (`Arc`); the registry never owns their lifecycle

pub mod registry;

pub use registry::{
    get_module, global, normalize_name, register_module, ModuleHandle, ModuleRegistry,
    RegistrationConflict, EXT_PREFIX,
};
