//! Command execution and shutdown ordering.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;

use crate::config::Settings;
use crate::lifecycle::context::RootContext;
use crate::lifecycle::exit::{exit_status, CommandResult, GENERIC_FAILURE};
use crate::observability::{fallback_dispatch, Console, LogSinkConfigurator};

/// Lifecycle states, in the order they can be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running,
    Success,
    Failure,
    Draining,
    Terminated,
}

/// What a command gets to work with.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Cancelled when the process starts shutting down.
    pub cancel: CancellationToken,

    /// Resolved process settings.
    pub settings: Arc<Settings>,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Status the process should exit with.
    pub exit_code: i32,

    /// Hint attached to the failure, if any.
    pub hint: Option<String>,

    /// Whether the remote log drain ran.
    pub drained: bool,

    /// Phases entered, in order.
    pub phases: Vec<Phase>,
}

/// Drives one process invocation: logging setup, command execution, drain.
pub struct LifecycleController {
    settings: Arc<Settings>,
    console: Console,
    fallback: Dispatch,
    root: RootContext,
    install_global: bool,
    phases: Vec<Phase>,
}

impl LifecycleController {
    pub fn new(settings: Settings, console: Console) -> Self {
        let fallback = fallback_dispatch(&console);
        Self {
            settings: Arc::new(settings),
            console,
            fallback,
            root: RootContext::new(),
            install_global: false,
            phases: Vec::new(),
        }
    }

    /// Also make the configured logger the process-wide default.
    ///
    /// Without this the logger is only active while the command future is polled.
    pub fn install_global(mut self, install: bool) -> Self {
        self.install_global = install;
        self
    }

    pub fn root(&self) -> &RootContext {
        &self.root
    }

    /// Configure logging, run `command`, then shut down in order.
    ///
    /// When a remote sink is active this waits, without a timeout, until the
    /// delivery worker has flushed everything.
    pub async fn execute<F, Fut>(mut self, command: F) -> Outcome
    where
        F: FnOnce(CommandContext) -> Fut,
        Fut: Future<Output = CommandResult>,
    {
        self.enter(Phase::Init);

        let configurator = LogSinkConfigurator::new(&self.console, self.fallback.clone());
        let setup = match configurator.configure(&self.settings.log, &self.root) {
            Ok(setup) => setup,
            Err(e) => {
                tracing::dispatcher::with_default(&self.fallback, || {
                    tracing::error!(error = %e, "Failed to configure logging");
                });
                self.enter(Phase::Failure);
                return self.terminate(GENERIC_FAILURE, None, false);
            }
        };
        let is_remote = setup.resolved.is_remote();
        let dispatch = setup.dispatch;

        if self.install_global && tracing::dispatcher::set_global_default(dispatch.clone()).is_err() {
            tracing::dispatcher::with_default(&dispatch, || {
                tracing::debug!("Global logger already set, logging scoped to the command");
            });
        }

        self.enter(Phase::Running);
        let ctx = CommandContext {
            cancel: self.root.subscribe(),
            settings: self.settings.clone(),
        };
        let result = async move {
            tracing::debug!("k6 version: v{}", env!("CARGO_PKG_VERSION"));
            command(ctx).await
        }
        .with_subscriber(dispatch.clone())
        .await;

        let (exit_code, hint) = match result {
            Ok(()) => {
                self.enter(Phase::Success);
                (0, None)
            }
            Err(err) => {
                self.enter(Phase::Failure);
                let (code, hint) = exit_status(err.as_ref());
                tracing::dispatcher::with_default(&dispatch, || tracing::error!(hint, "{err}"));
                if is_remote {
                    tracing::dispatcher::with_default(&self.fallback, || {
                        tracing::error!(hint, "{err}")
                    });
                }
                (code, hint.map(str::to_owned))
            }
        };

        if is_remote {
            self.enter(Phase::Draining);
            self.root.cancel();
            setup.stopped.wait().await;
        }

        self.terminate(exit_code, hint, is_remote)
    }

    fn terminate(mut self, exit_code: i32, hint: Option<String>, drained: bool) -> Outcome {
        self.root.cancel();
        self.enter(Phase::Terminated);
        Outcome {
            exit_code,
            hint,
            drained,
            phases: self.phases,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
}
