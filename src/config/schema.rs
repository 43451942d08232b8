//! Configuration schema definitions.
//!
//! `GlobalFlags` is what clap parses; `Settings` is what the rest of the
//! crate sees once flags and environment have been merged.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use serde::Serialize;

/// Persistent flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalFlags {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress updates
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Change the output for logs, possible values are stderr,stdout,none,remote-uri[=host:port]
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log output format
    #[arg(long = "logformat", global = true, default_value = "")]
    pub log_format: String,

    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Address for the api server
    #[arg(short, long, global = true, default_value = "localhost:6565")]
    pub address: String,
}

/// Resolved process settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Logging configuration (still unvalidated strings).
    pub log: LogConfig,

    /// Suppress progress output.
    pub quiet: bool,

    /// Config file handed to the external config loader.
    pub config_path: PathBuf,

    /// REST API address.
    pub address: String,
}

/// Logging configuration as supplied by the caller.
///
/// `output` and `format` are kept as strings: turning them into a sink is the
/// configurator's job, and an unsupported value must fail there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfig {
    /// `stderr`, `stdout`, `none` or `remote-uri[=...]`.
    pub output: String,

    /// `raw`, `json`, `text`; anything else means text.
    pub format: String,

    /// Raise the level to debug.
    pub verbose: bool,

    /// Never emit ANSI colors.
    pub no_color: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: "stderr".to_string(),
            format: String::new(),
            verbose: false,
            no_color: false,
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput {
    Stderr,
    Stdout,
    None,
    Remote(RemoteConfig),
}

impl LogOutput {
    pub fn is_remote(&self) -> bool {
        matches!(self, LogOutput::Remote(_))
    }
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Message text only.
    Raw,
    /// One JSON record per event.
    Json,
    /// Human readable, optionally colorized.
    #[default]
    Text,
}

impl LogFormat {
    /// Unknown and empty values fall back to text.
    pub fn from_flag(value: &str) -> Self {
        match value {
            "raw" => LogFormat::Raw,
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogFormat::Raw => "RAW",
            LogFormat::Json => "JSON",
            LogFormat::Text => "TEXT",
        }
    }
}

/// Connection descriptor for the remote log sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    /// `host:port` the delivery worker pushes to.
    pub address: String,

    /// Lines buffered between pushes before new ones are dropped.
    pub limit: usize,

    /// Interval between pushes.
    pub push_period: Duration,

    /// Most verbose level forwarded to the sink.
    pub level: tracing::Level,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5170".to_string(),
            limit: 100,
            push_period: Duration::from_secs(1),
            level: tracing::Level::DEBUG,
        }
    }
}
