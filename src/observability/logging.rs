//! Structured logging setup.
//!
//! # Responsibilities
//! - Resolve a [`LogConfig`] into a sink, a format and a level
//! - Start the remote delivery worker when a remote sink is selected
//! - Hand back a `Dispatch` plus the signal that tracks remote delivery
//!
//! # Design Decisions
//! - Uses tracing-subscriber fmt layers for every sink
//! - Validation runs before anything is spawned or bound
//! - Remote output forces raw format and disables color

use std::io::{self, IsTerminal};
use std::sync::Arc;

use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{parse_log_output, ConfigError, LogConfig, LogFormat, LogOutput};
use crate::lifecycle::RootContext;
use crate::observability::format::RawFormatter;
use crate::observability::remote::spawn_delivery;
use crate::observability::signal::SignalHandle;

type WriterFactory = dyn Fn() -> Box<dyn io::Write + Send> + Send + Sync;

/// A local output stream and whether it is attached to a terminal.
#[derive(Clone)]
pub struct Stream {
    factory: Arc<WriterFactory>,
    is_terminal: bool,
}

impl Stream {
    pub fn new<F>(factory: F, is_terminal: bool) -> Self
    where
        F: Fn() -> Box<dyn io::Write + Send> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            is_terminal,
        }
    }

    pub fn stdout() -> Self {
        Self::new(|| Box::new(io::stdout()), io::stdout().is_terminal())
    }

    pub fn stderr() -> Self {
        Self::new(|| Box::new(io::stderr()), io::stderr().is_terminal())
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}

impl<'a> MakeWriter<'a> for Stream {
    type Writer = Box<dyn io::Write + Send>;

    fn make_writer(&'a self) -> Self::Writer {
        (self.factory)()
    }
}

/// The process's local output streams.
#[derive(Clone)]
pub struct Console {
    pub stdout: Stream,
    pub stderr: Stream,
}

impl Console {
    /// Real stdout/stderr with terminal detection.
    pub fn detect() -> Self {
        Self {
            stdout: Stream::stdout(),
            stderr: Stream::stderr(),
        }
    }
}

/// Logger used when the configured one cannot be trusted: plain text on stderr.
pub fn fallback_dispatch(console: &Console) -> Dispatch {
    let layer = fmt::layer()
        .with_ansi(console.stderr.is_terminal())
        .with_writer(console.stderr.clone())
        .with_filter(LevelFilter::INFO);
    Dispatch::new(tracing_subscriber::registry().with(layer))
}

/// What the configuration resolved to after defaults and overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLogConfig {
    pub output: LogOutput,
    pub format: LogFormat,
    pub level: Level,
    pub color: bool,
}

impl ResolvedLogConfig {
    pub fn is_remote(&self) -> bool {
        self.output.is_remote()
    }
}

/// Result of a successful configuration.
pub struct LogSetup {
    /// The configured logger. Not installed anywhere yet.
    pub dispatch: Dispatch,

    /// Effective settings.
    pub resolved: ResolvedLogConfig,

    /// Closed immediately for local sinks; closed after drain for remote ones.
    pub stopped: SignalHandle,
}

/// Builds loggers from a [`LogConfig`].
pub struct LogSinkConfigurator<'a> {
    console: &'a Console,
    fallback: Dispatch,
    env_directives: Option<String>,
}

impl<'a> LogSinkConfigurator<'a> {
    /// Filter directives are read from `RUST_LOG`.
    pub fn new(console: &'a Console, fallback: Dispatch) -> Self {
        Self {
            console,
            fallback,
            env_directives: std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        }
    }

    /// Use these filter directives instead of `RUST_LOG`.
    pub fn with_env_directives(mut self, directives: Option<String>) -> Self {
        self.env_directives = directives;
        self
    }

    /// Resolve `config` into a logger.
    ///
    /// A remote output spawns the delivery worker on the current Tokio
    /// runtime; the worker stops when `root` is cancelled.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for an unsupported or malformed output, or
    /// for a remote output requested outside a Tokio runtime, before any sink
    /// is created.
    pub fn configure(&self, config: &LogConfig, root: &RootContext) -> Result<LogSetup, ConfigError> {
        let output = parse_log_output(&config.output)?;
        let mut format = LogFormat::from_flag(&config.format);
        let mut no_color = config.no_color;
        let level = if config.verbose { Level::DEBUG } else { Level::INFO };

        let (writer, stopped, is_terminal) = match &output {
            LogOutput::Stderr => (
                BoxMakeWriter::new(self.console.stderr.clone()),
                SignalHandle::closed(),
                self.console.stderr.is_terminal(),
            ),
            LogOutput::Stdout => (
                BoxMakeWriter::new(self.console.stdout.clone()),
                SignalHandle::closed(),
                self.console.stdout.is_terminal(),
            ),
            LogOutput::None => (BoxMakeWriter::new(io::sink), SignalHandle::closed(), false),
            LogOutput::Remote(remote) => {
                if tokio::runtime::Handle::try_current().is_err() {
                    return Err(ConfigError::RuntimeUnavailable);
                }
                format = LogFormat::Raw;
                no_color = true;
                let (writer, stopped) =
                    spawn_delivery(remote, root.subscribe(), self.fallback.clone());
                (
                    BoxMakeWriter::new(writer.with_max_level(remote.level)),
                    stopped,
                    false,
                )
            }
        };

        let color = format == LogFormat::Text && is_terminal && !no_color;
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
            LogFormat::Raw => fmt::layer()
                .event_format(RawFormatter)
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
            LogFormat::Text => fmt::layer().with_ansi(color).with_writer(writer).boxed(),
        };
        let filter = level_filter(level, config.verbose, self.env_directives.as_deref());

        let dispatch = Dispatch::new(Registry::default().with(layer).with(filter));
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("Logger format: {}", format.label());
        });

        Ok(LogSetup {
            dispatch,
            resolved: ResolvedLogConfig {
                output,
                format,
                level,
                color,
            },
            stopped,
        })
    }
}

/// `level` is the default for targets the env directives do not name. A bare
/// env level replaces it, except that `verbose` never ends up quieter than `level`.
fn level_filter(level: Level, verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    let floor = LevelFilter::from_level(level);
    let directives = env_directives.unwrap_or("");
    let filter = EnvFilter::builder()
        .with_default_directive(floor.into())
        .parse_lossy(directives);

    let env_default = directives
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter_map(|d| d.parse::<LevelFilter>().ok())
        .last();
    match env_default {
        Some(env_level) if !verbose || env_level >= floor => filter,
        _ => filter.add_directive(floor.into()),
    }
}
