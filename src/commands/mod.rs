pub mod apply;
pub mod config;
pub mod plan;
pub mod read;
pub mod units;

use crate::config::Config;
use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use translate::{NodeChange, TransactionOptions};
use ::units::Device;

/// Device from `--device`, falling back to `default_device` in config
pub fn resolve_device(arg: Option<&str>, config: &Config) -> Result<Device> {
    let name = arg
        .or(config.default_device.as_deref())
        .context("No device given (use --device or set default_device in config.toml)")?;
    Ok(name.parse()?)
}

/// Load a JSON change list
pub fn load_changes(path: &Path) -> Result<Vec<NodeChange>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let changes: Vec<NodeChange> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid change list in {}", path.display()))?;
    log::info!("Loaded {} change(s) from {}", changes.len(), path.display());
    Ok(changes)
}

/// Transaction options for `device`: its rejection patterns and `jobs` workers
pub fn transaction_options(device: Device, jobs: usize) -> Result<TransactionOptions> {
    Ok(TransactionOptions {
        jobs: jobs.max(1),
        error_patterns: ::units::error_patterns(device)?,
    })
}

/// Print a translation failure with its path, advice and offending states
pub fn explain(err: &translate::Error) {
    ui::error(&format!("{}: {}", err.kind(), err.message()));
    ui::kv("path", &err.path().to_string());
    if let Some(before) = err.before() {
        ui::kv("before", &before.to_string());
    }
    if let Some(after) = err.after() {
        ui::kv("after", &after.to_string());
    }
    ui::dim(err.kind().advice());
}
