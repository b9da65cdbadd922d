use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

// Checkpoints live under <home>/.cache/ace-step/checkpoints unless a directory is given
pub const CACHE_NAMESPACE: &str = "ace-step";
pub const CHECKPOINTS_DIR: &str = "checkpoints";

// Cache root below an arbitrary home directory
pub fn cache_root_under(home: &Path) -> PathBuf {
    home.join(".cache").join(CACHE_NAMESPACE).join(CHECKPOINTS_DIR)
}

// Cache root below the current user's home
pub fn default_cache_root() -> Result<PathBuf> {
    let dirs = BaseDirs::new().context("Could not determine the user home directory")?;
    Ok(cache_root_under(dirs.home_dir()))
}
