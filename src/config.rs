//! clitrans configuration file (`config.toml`)
//!
//! ```toml
//! default_device = "ios-xr"
//! jobs = 4
//! timeout_secs = 30
//! transcripts_dir = "~/lab/transcripts"
//!
//! [exec]
//! program = "ssh"
//! args = ["-T", "admin@pe1.lab"]
//! ```
//!
//! Every field is optional. A missing file yields the defaults.

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device type used when `--device` is not given
    pub default_device: Option<String>,
    /// Worker threads for subtree reads
    pub jobs: usize,
    /// Seconds to wait for one batch on the exec channel
    pub timeout_secs: u64,
    pub exec: ExecConfig,
    /// Directory searched for relative transcript paths
    pub transcripts_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_device: None,
            jobs: default_jobs(),
            timeout_secs: 30,
            exec: ExecConfig::default(),
            transcripts_dir: None,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(8)
}

/// External program every write batch is piped into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(CONFIG_FILE))
    }

    /// Load from `path`, or from the config directory when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::default_path()?),
        }
    }

    /// Load from an explicit file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve a transcript argument
    ///
    /// Relative paths that do not exist in the working directory are looked up
    /// in `transcripts_dir`.
    pub fn transcript_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            return file.to_path_buf();
        }
        match &self.transcripts_dir {
            Some(dir) => paths::expand_path(dir).join(file),
            None => file.to_path_buf(),
        }
    }
}
