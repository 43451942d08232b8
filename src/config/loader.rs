//! Merges CLI flags with environment overrides into [`Settings`].

use std::path::PathBuf;

use crate::config::schema::{GlobalFlags, LogConfig, Settings};

/// Log output used when `--log-output` is not given.
pub const LOG_OUTPUT_ENV: &str = "K6_LOG_OUTPUT";

/// Config file used when `--config` is not given.
pub const CONFIG_ENV: &str = "K6_CONFIG";

const DEFAULT_CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_LOG_OUTPUT: &str = "stderr";

/// `<user config dir>/loadimpact/k6/config.json`.
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not get config directory, using .config");
        PathBuf::from(".config")
    });
    config_dir
        .join("loadimpact")
        .join("k6")
        .join(DEFAULT_CONFIG_FILE_NAME)
}

/// Build the process settings.
///
/// Environment values are consulted only for flags the caller left unset.
pub fn resolve_settings<F>(flags: &GlobalFlags, env: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let output = flags
        .log_output
        .clone()
        .or_else(|| env(LOG_OUTPUT_ENV))
        .unwrap_or_else(|| DEFAULT_LOG_OUTPUT.to_string());

    let config_path = flags
        .config
        .clone()
        .or_else(|| env(CONFIG_ENV).filter(|p| !p.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default_config_path);

    Settings {
        log: LogConfig {
            output,
            format: flags.log_format.clone(),
            verbose: flags.verbose,
            no_color: flags.no_color,
        },
        quiet: flags.quiet,
        config_path,
        address: flags.address.clone(),
    }
}
