use anyhow::{Context, Result};
use log::{info, warn};
use std::env;
use std::path::{self, PathBuf};

use crate::hub::{ModelHub, RepoSpec};
use crate::marker::{self, DownloadMarker};
use crate::paths;

pub const FAST_TRANSFER_VAR: &str = "HF_HUB_ENABLE_HF_TRANSFER";

// Where to put the checkpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub checkpoint_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>, // only used when checkpoint_dir is None
}

impl DownloadRequest {
    /// Cache root handed to the hub client. An explicit `checkpoint_dir`
    /// wins over `home_dir`; with neither, the user's home is used.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match (&self.checkpoint_dir, &self.home_dir) {
            (Some(dir), Some(home)) => {
                warn!("Both checkpoint_dir {:?} and home_dir {:?} given, ignoring home_dir", dir, home);
                Ok(dir.clone())
            }
            (Some(dir), None) => Ok(dir.clone()),
            (None, Some(home)) => Ok(paths::cache_root_under(home)),
            (None, None) => paths::default_cache_root(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub actual_path: PathBuf,
    pub previous_marker: Option<DownloadMarker>, // flag file found before this run wrote one
}

// Optional side effects after a successful download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub write_flag_file: bool,
    pub export_path: Option<PathBuf>,
}

pub fn enable_fast_transfer() {
    env::set_var(FAST_TRANSFER_VAR, "1");
}

/// Make sure every file of `repo` is present locally and return the snapshot
/// directory. Hub errors are returned as-is; nothing is retried.
pub fn fetch<H: ModelHub + ?Sized>(
    hub: &H,
    repo: &RepoSpec,
    request: &DownloadRequest,
    options: &FetchOptions,
) -> Result<DownloadResult> {
    enable_fast_transfer();

    let cache_root = request.cache_root()?;
    info!("Fetching {} into {:?}", repo.repo_id, cache_root);

    let snapshot = hub
        .snapshot(repo, &cache_root)
        .with_context(|| format!("Download of {} failed", repo.repo_id))?;
    let actual_path = path::absolute(&snapshot)
        .with_context(|| format!("Cannot resolve {:?}", snapshot))?;
    info!("Snapshot of {} at {:?}", repo.repo_id, actual_path);

    let previous_marker = match marker::read_marker(&actual_path) {
        Ok(Some(prev)) => {
            info!("Already marked as downloaded at {}", prev.timestamp);
            Some(prev)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Ignoring unreadable flag file: {e:#}");
            None
        }
    };

    if options.write_flag_file {
        let flag = marker::write_marker(&actual_path)?;
        info!("Wrote flag file {:?}", flag);
    }
    if let Some(file) = &options.export_path {
        marker::export_path(file, &actual_path)?;
        info!("Exported path to {:?}", file);
    }

    Ok(DownloadResult {
        actual_path,
        previous_marker,
    })
}
