//! Start-up configuration: config file, then environment, then flags.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use structurer_engine::{EngineConfig, SelectorScan};
use structurer_logging::{level_for_environment, structurer_info, LogSettings};

use crate::cli::Args;

/// Selects the log level (`development`, `production` or `testing`).
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";

pub fn log_settings<F>(args: &Args, lookup: F) -> LogSettings
where
    F: Fn(&str) -> Option<String>,
{
    let environment = lookup(ENVIRONMENT_ENV).unwrap_or_else(|| "development".to_string());
    LogSettings {
        level: level_for_environment(&environment),
        terminal: true,
        file: args.log_file.clone(),
    }
}

pub fn engine_config<F>(args: &Args, lookup: F) -> anyhow::Result<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    config
        .apply_env(lookup)
        .context("invalid environment override")?;

    if let Some(secs) = args.timeout {
        let timeout = Duration::from_secs_f64(secs);
        config.fetch.request_timeout = timeout;
        config.library_timeout = timeout;
    }
    if args.full_scan {
        config.selector_scan = SelectorScan::LongestOverall;
    }

    config.validate().context("invalid engine configuration")
}

fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: EngineConfig = ron::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    structurer_info!("Loaded engine config from {:?}", path);
    Ok(config)
}
