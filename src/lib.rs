// Pull a model snapshot from the Hugging Face Hub into a local cache,
// optionally leaving a marker file and exporting the resolved path.

pub mod fetcher;
pub mod hub;
pub mod marker;
pub mod paths;

pub use fetcher::{fetch, DownloadRequest, DownloadResult, FetchOptions};
pub use hub::{HfHub, ModelHub, RepoSpec};
pub use marker::{DownloadMarker, FLAG_FILE_NAME};
