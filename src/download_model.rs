/*
cargo run --bin download_model -- /app/checkpoints --write-flag \
    --export-path /tmp/ace_step_checkpoint_path

Without a directory the model lands in /home/appuser/.cache/ace-step/checkpoints
*/

use ace_fetch::{fetch, DownloadRequest, FetchOptions, HfHub, RepoSpec};
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use log::info;
use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};
use std::fs::{create_dir_all, File};
use std::path::PathBuf;

// Download the ACE-Step checkpoints from the Hugging Face Hub.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    // Checkpoint directory (hub cache root)
    #[arg(value_name = "CHECKPOINT_DIR")]
    checkpoint_dir: Option<PathBuf>,

    // Home directory for the default cache, used only without CHECKPOINT_DIR
    #[arg(long, value_name = "DIR", default_value = "/home/appuser")]
    home_dir: PathBuf,

    // Hub repository ID
    #[arg(long, default_value = ace_fetch::hub::DEFAULT_REPO_ID)]
    repo: String,

    #[arg(long, default_value = ace_fetch::hub::DEFAULT_REVISION)]
    revision: String,

    // HF access token (falls back to cached creds)
    #[arg(long, env = "HF_TOKEN")]
    token: Option<String>,

    // Leave model_downloaded.flag in the snapshot directory
    #[arg(long)]
    write_flag: bool,

    // Write the resolved directory into this file
    #[arg(long, value_name = "FILE")]
    export_path: Option<PathBuf>,

    #[arg(long)]
    no_progress: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Args {
    fn request(&self) -> DownloadRequest {
        match &self.checkpoint_dir {
            Some(dir) => DownloadRequest {
                checkpoint_dir: Some(dir.clone()),
                home_dir: None,
            },
            None => DownloadRequest {
                checkpoint_dir: None,
                home_dir: Some(self.home_dir.clone()),
            },
        }
    }

    fn repo(&self) -> RepoSpec {
        RepoSpec {
            repo_id: self.repo.clone(),
            revision: self.revision.clone(),
            token: self.token.clone(),
        }
    }

    fn options(&self) -> FetchOptions {
        FetchOptions {
            write_flag_file: self.write_flag,
            export_path: self.export_path.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // logging setup
    create_dir_all(&args.log_dir)?;
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = args.log_dir.join(format!("download_model_{ts}.log"));
    WriteLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        File::create(&log_path)?,
    )?;
    info!(
        "Started - repo: {} @ {}, checkpoint_dir: {:?}, home_dir: {:?}",
        args.repo, args.revision, args.checkpoint_dir, args.home_dir
    );

    let request = args.request();
    let repo = args.repo();

    println!("⇣  Downloading {} ...", repo.repo_id);
    match (&request.checkpoint_dir, &request.home_dir) {
        (Some(dir), _) => println!("   Using custom checkpoint directory: {:?}", dir),
        (None, Some(home)) => println!("   Using home directory {:?} for the cache", home),
        (None, None) => {}
    }

    let hub = HfHub::new(!args.no_progress);
    let result = fetch(&hub, &repo, &request, &args.options())?;

    println!("   Models were downloaded to: {:?}", result.actual_path);
    if let Some(prev) = &result.previous_marker {
        println!("   (already marked as downloaded at {})", prev.timestamp);
    }
    if args.write_flag {
        println!("   Flag file written in {:?}", result.actual_path);
    }
    if let Some(file) = &args.export_path {
        println!("   Path exported to {:?}", file);
    }
    println!("✔  Model download complete!");
    info!("Done - {:?}", result.actual_path);
    Ok(())
}
