use anyhow::{anyhow, Context, Result};
use hf_hub::{api::sync::ApiBuilder, Repo, RepoType};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_REPO_ID: &str = "ACE-Step/ACE-Step-v1-3.5B";
pub const DEFAULT_REVISION: &str = "main";

// Which Hub repository to pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub repo_id: String,
    pub revision: String,
    pub token: Option<String>, // falls back to cached creds when None
}

impl Default for RepoSpec {
    fn default() -> Self {
        Self {
            repo_id: DEFAULT_REPO_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            token: None,
        }
    }
}

/// The model hub as seen by the fetcher: make every file of `repo` present
/// below `cache_root` and return the local snapshot directory.
pub trait ModelHub {
    fn snapshot(&self, repo: &RepoSpec, cache_root: &Path) -> Result<PathBuf>;
}

// Hugging Face Hub through the blocking hf-hub client
#[derive(Debug, Clone)]
pub struct HfHub {
    progress: bool,
}

impl HfHub {
    pub fn new(progress: bool) -> Self {
        Self { progress }
    }
}

impl Default for HfHub {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HfHub {
    // ApiBuilder::new() already picked up the token saved by `huggingface-cli login`;
    // only an explicit token may replace it
    pub fn api_builder(&self, repo: &RepoSpec, cache_root: &Path) -> ApiBuilder {
        let mut builder = ApiBuilder::new();
        if let Some(token) = &repo.token {
            builder = builder.with_token(Some(token.clone()));
        }
        builder
            .with_cache_dir(cache_root.to_path_buf())
            .with_progress(false)
    }
}

impl ModelHub for HfHub {
    fn snapshot(&self, repo: &RepoSpec, cache_root: &Path) -> Result<PathBuf> {
        let api = self
            .api_builder(repo, cache_root)
            .build()
            .context("Failed to build Hub client")?;

        let handle = api.repo(Repo::with_revision(
            repo.repo_id.clone(),
            RepoType::Model,
            repo.revision.clone(),
        ));

        // fetch metadata → list of files (siblings)
        let repo_info = handle
            .info()
            .with_context(|| format!("Failed to fetch repo info for {}", repo.repo_id))?;
        if repo_info.siblings.is_empty() {
            return Err(anyhow!("Repository {} lists no files", repo.repo_id));
        }
        info!(
            "{} @ {} ({}): {} files",
            repo.repo_id,
            repo.revision,
            repo_info.sha,
            repo_info.siblings.len()
        );

        let bar = if self.progress {
            ProgressBar::new(repo_info.siblings.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                 {pos}/{len} {msg}",
            )?,
        );
        bar.enable_steady_tick(Duration::from_millis(200));

        // download each file into the cache (or reuse it)
        let mut root: Option<PathBuf> = None;
        for sib in &repo_info.siblings {
            bar.set_message(sib.rfilename.clone());
            let cached = handle
                .get(&sib.rfilename)
                .with_context(|| format!("Failed to download {}", sib.rfilename))?;
            info!("Cached {} → {:?}", sib.rfilename, cached);

            if root.is_none() {
                root = snapshot_root(&cached, &sib.rfilename);
            }
            bar.inc(1);
        }
        bar.finish_with_message("done");

        root.ok_or_else(|| anyhow!("Could not locate snapshot directory for {}", repo.repo_id))
    }
}

// Strip the repo-relative file path off a cached file to get the snapshot dir
pub fn snapshot_root(cached: &Path, rfilename: &str) -> Option<PathBuf> {
    let depth = Path::new(rfilename).components().count();
    if depth == 0 {
        return None;
    }
    cached.ancestors().nth(depth).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_root_top_level_file() {
        let cached = Path::new("/c/models--a--b/snapshots/abc123/config.json");
        assert_eq!(
            snapshot_root(cached, "config.json"),
            Some(PathBuf::from("/c/models--a--b/snapshots/abc123"))
        );
    }

    #[test]
    fn test_snapshot_root_nested_file() {
        let cached = Path::new(
            "/c/models--a--b/snapshots/abc123/music_dcae_f8c8/diffusion_pytorch_model.safetensors",
        );
        assert_eq!(
            snapshot_root(cached, "music_dcae_f8c8/diffusion_pytorch_model.safetensors"),
            Some(PathBuf::from("/c/models--a--b/snapshots/abc123"))
        );
    }

    #[test]
    fn test_snapshot_root_empty_name() {
        assert_eq!(snapshot_root(Path::new("/c/x"), ""), None);
    }

    #[test]
    fn test_repo_spec_default() {
        let spec = RepoSpec::default();
        assert_eq!(spec.repo_id, "ACE-Step/ACE-Step-v1-3.5B");
        assert_eq!(spec.revision, "main");
        assert!(spec.token.is_none());
    }
}
