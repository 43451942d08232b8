//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LogConfig + Console
//!     → logging.rs (LogSinkConfigurator: validate, pick sink + format)
//!         stderr | stdout → fmt layer on the console stream
//!         none            → fmt layer on io::sink
//!         remote-uri      → remote.rs (bounded queue → delivery worker → TCP)
//!     → format.rs (raw formatter, message only)
//!     → signal.rs (closed once the delivery worker has drained)
//! ```
//!
//! # Design Decisions
//! - The configurator returns a `Dispatch` instead of installing it, so a
//!   failed configuration leaves the active logger untouched
//! - Remote sinks always get raw, uncolored lines
//! - The delivery worker reports its own problems to the fallback logger

pub mod format;
pub mod logging;
pub mod remote;
pub mod signal;

pub use logging::{fallback_dispatch, Console, LogSetup, LogSinkConfigurator, ResolvedLogConfig, Stream};
pub use signal::{signal_pair, SignalCloser, SignalHandle};
