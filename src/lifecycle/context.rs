//! Root cancellation context for a process invocation.

use tokio_util::sync::CancellationToken;

/// Owner of the process-wide cancellation.
///
/// Tasks receive child tokens via [`RootContext::subscribe`]. Cancellation
/// reaches every child, including those created afterwards, and cannot be
/// undone.
#[derive(Debug, Clone, Default)]
pub struct RootContext {
    token: CancellationToken,
}

impl RootContext {
    /// Create a new, uncancelled root context.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A child token observing this context.
    pub fn subscribe(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Cancel the context and every subscriber.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
