//! Log output validation.
//!
//! # Responsibilities
//! - Map the `--log-output` string to a [`LogOutput`]
//! - Parse the remote descriptor `remote-uri[=host:port][,key=value]*`
//!
//! # Design Decisions
//! - Pure functions: nothing is bound or spawned here
//! - Unknown remote options are rejected rather than ignored

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::{LogOutput, RemoteConfig};

const REMOTE_PREFIX: &str = "remote-uri";

/// Errors raised while turning settings into a logging setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `--log-output` is none of the known targets.
    #[error("unsupported log output `{0}`")]
    UnsupportedLogOutput(String),

    /// The remote address is not a `host:port` pair.
    #[error("invalid remote log address `{address}`: {reason}")]
    InvalidRemoteAddress { address: String, reason: String },

    /// A remote option was given without `=value`.
    #[error("remote log option `{0}` has no value")]
    MissingOptionValue(String),

    /// A remote option key is not recognised.
    #[error("unknown remote log option `{0}`")]
    UnknownOption(String),

    /// Remote delivery needs a Tokio runtime to run its worker on.
    #[error("remote log output requires a running Tokio runtime")]
    RuntimeUnavailable,

    /// A remote option value could not be parsed.
    #[error("invalid value `{value}` for remote log option `{key}`")]
    InvalidOptionValue { key: String, value: String },
}

/// Parse a `--log-output` value.
pub fn parse_log_output(value: &str) -> Result<LogOutput, ConfigError> {
    match value {
        "stderr" => Ok(LogOutput::Stderr),
        "stdout" => Ok(LogOutput::Stdout),
        "none" => Ok(LogOutput::None),
        REMOTE_PREFIX => Ok(LogOutput::Remote(RemoteConfig::default())),
        other => match other.strip_prefix(REMOTE_PREFIX) {
            Some(rest) if rest.starts_with('=') => parse_remote(&rest[1..]).map(LogOutput::Remote),
            // options without an address: the leading empty token keeps the default
            Some(rest) if rest.starts_with(',') => parse_remote(rest).map(LogOutput::Remote),
            _ => Err(ConfigError::UnsupportedLogOutput(other.to_string())),
        },
    }
}

fn parse_remote(descriptor: &str) -> Result<RemoteConfig, ConfigError> {
    let mut config = RemoteConfig::default();
    let mut parts = descriptor.split(',');

    if let Some(address) = parts.next().filter(|a| !a.is_empty()) {
        config.address = parse_address(address)?;
    }

    for option in parts {
        let (key, value) = option
            .split_once('=')
            .filter(|(_, v)| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingOptionValue(option.to_string()))?;
        let invalid = || ConfigError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "limit" => {
                config.limit = value
                    .parse::<usize>()
                    .ok()
                    .filter(|l| *l > 0)
                    .ok_or_else(invalid)?;
            }
            "pushPeriod" => config.push_period = parse_duration(value).ok_or_else(invalid)?,
            "level" => config.level = value.parse().map_err(|_| invalid())?,
            _ => return Err(ConfigError::UnknownOption(key.to_string())),
        }
    }

    Ok(config)
}

fn parse_address(address: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRemoteAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("tcp://{address}")
    };
    let url = Url::parse(&candidate).map_err(|e| invalid(&e.to_string()))?;

    if url.scheme() != "tcp" {
        return Err(invalid("only tcp:// is supported"));
    }
    if !(url.path().is_empty() || url.path() == "/") || url.query().is_some() {
        return Err(invalid("unexpected path or query"));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid("missing host"))?;
    let port = url.port().ok_or_else(|| invalid("missing port"))?;

    Ok(format!("{host}:{port}"))
}

/// Parse `<n>ms`, `<n>s` or `<n>m`. Zero is rejected.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let split = value.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.checked_mul(60)?),
        _ => return None,
    };
    (!duration.is_zero()).then_some(duration)
}
