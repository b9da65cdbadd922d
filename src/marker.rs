use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const FLAG_FILE_NAME: &str = "model_downloaded.flag";

// Contents of the flag file left next to the checkpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadMarker {
    pub downloaded: bool,
    pub timestamp: String, // RFC 3339, local time
    pub path: String,
}

impl DownloadMarker {
    pub fn for_dir(dir: &Path) -> Result<Self> {
        let path = dir
            .to_str()
            .with_context(|| format!("Path {:?} is not valid UTF-8", dir))?;
        Ok(Self {
            downloaded: true,
            timestamp: Local::now().to_rfc3339(),
            path: path.to_string(),
        })
    }
}

/// Write `<dir>/model_downloaded.flag` and return its path.
pub fn write_marker(dir: &Path) -> Result<PathBuf> {
    let marker = DownloadMarker::for_dir(dir)?;
    let flag_path = dir.join(FLAG_FILE_NAME);
    let file = File::create(&flag_path)
        .with_context(|| format!("Failed to create flag file {:?}", flag_path))?;
    serde_json::to_writer_pretty(file, &marker)
        .with_context(|| format!("Failed to write flag file {:?}", flag_path))?;
    Ok(flag_path)
}

/// Read the flag file in `dir`; `None` when there is none.
pub fn read_marker(dir: &Path) -> Result<Option<DownloadMarker>> {
    let flag_path = dir.join(FLAG_FILE_NAME);
    let text = match fs::read_to_string(&flag_path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", flag_path)),
    };
    let marker = serde_json::from_str(&text)
        .with_context(|| format!("Malformed flag file {:?}", flag_path))?;
    Ok(Some(marker))
}

// Hand the resolved directory to whatever build step reads `file`
pub fn export_path(file: &Path, dir: &Path) -> Result<()> {
    let path = dir
        .to_str()
        .with_context(|| format!("Path {:?} is not valid UTF-8", dir))?;
    if let Some(parent) = file.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    fs::write(file, path)
        .with_context(|| format!("Failed to export path to {:?}", file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();

        let flag_path = write_marker(dir.path()).unwrap();
        assert_eq!(flag_path, dir.path().join("model_downloaded.flag"));

        let marker = read_marker(dir.path()).unwrap().unwrap();
        assert!(marker.downloaded);
        assert_eq!(marker.path, dir.path().to_string_lossy());
        assert!(chrono::DateTime::parse_from_rfc3339(&marker.timestamp).is_ok());
    }

    #[test]
    fn test_marker_json_field_names() {
        let dir = tempfile::tempdir().unwrap();
        write_marker(dir.path()).unwrap();

        let raw = fs::read_to_string(dir.path().join(FLAG_FILE_NAME)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["downloaded"], serde_json::Value::Bool(true));
        assert!(value["timestamp"].is_string());
        assert!(value["path"].is_string());
    }

    #[test]
    fn test_read_marker_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_marker(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_read_marker_malformed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FLAG_FILE_NAME), "not json").unwrap();
        assert!(read_marker(dir.path()).is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_dir_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join(OsStr::from_bytes(b"snap\xff"));
        fs::create_dir_all(&odd).unwrap();

        assert!(write_marker(&odd).is_err());
        assert!(!odd.join(FLAG_FILE_NAME).exists());
        assert!(export_path(&dir.path().join("path.txt"), &odd).is_err());
    }

    #[test]
    fn test_export_path_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("build/model_path.txt");

        export_path(&file, Path::new("/models/snapshots/abc")).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "/models/snapshots/abc");
    }
}
