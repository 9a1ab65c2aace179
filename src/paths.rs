//! Path resolution for clitrans
//!
//! # Environment Variables
//!
//! - `CLITRANS_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/clitrans`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CLITRANS_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/clitrans` (if set)
//! 3. `~/.config/clitrans`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CLITRANS_CONFIG_DIR";

const APP_NAME: &str = "clitrans";

/// Get the clitrans config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand_path(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        let path = expand_path(&xdg).join(APP_NAME);
        log::debug!("Using XDG config dir: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_NAME);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand `~` and environment variables in a path
///
/// Falls back to tilde-only expansion when a variable is undefined.
pub fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| shellexpand::tilde(path).into_owned());
    PathBuf::from(expanded)
}
