//! Structured command errors carrying an exit status.

use std::error::Error;
use std::fmt;

/// Exit status for errors that carry no explicit code.
pub const GENERIC_FAILURE: i32 = -1;

/// Error type returned by commands.
pub type CommandError = Box<dyn Error + Send + Sync>;

/// Result type returned by commands.
pub type CommandResult = Result<(), CommandError>;

/// A command failure with a specific exit status and an optional hint for the user.
#[derive(Debug)]
pub struct ExitCode {
    error: CommandError,
    pub code: i32,
    pub hint: Option<String>,
}

impl ExitCode {
    pub fn new(code: i32, error: impl Into<CommandError>) -> Self {
        Self {
            error: error.into(),
            code,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for ExitCode {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Exit status and hint for a command error.
///
/// An [`ExitCode`] yields its own code and hint; anything else is
/// [`GENERIC_FAILURE`]. An empty hint counts as no hint.
pub fn exit_status<'a>(error: &'a (dyn Error + Send + Sync + 'static)) -> (i32, Option<&'a str>) {
    match error.downcast_ref::<ExitCode>() {
        Some(exit) => (exit.code, exit.hint.as_deref().filter(|h| !h.is_empty())),
        None => (GENERIC_FAILURE, None),
    }
}
