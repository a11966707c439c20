//! Local filesystem snapshot dumps.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── sydney_events_20250104_093000.json
//! └── sydney_events_20250105_093000.json
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;
use crate::models::Envelope;

/// File name of a snapshot generated at `at`.
pub fn snapshot_file_name(at: DateTime<Local>) -> String {
    format!("sydney_events_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Write an envelope to a timestamped JSON file and return its path.
    pub fn write_snapshot(&self, envelope: &Envelope) -> Result<PathBuf> {
        let path = self.root_dir.join(snapshot_file_name(Local::now()));
        self.write_json(&path, envelope)?;
        log::info!("Snapshot saved to {}", path.display());
        Ok(path)
    }

    /// Write JSON atomically (write to temp, then rename).
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.flush()?;
        drop(file);

        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_snapshot_file_name() {
        let at = Local.with_ymd_and_hms(2025, 1, 4, 9, 30, 5).unwrap();
        assert_eq!(snapshot_file_name(at), "sydney_events_20250104_093005.json");
    }

    #[test]
    fn test_write_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("dumps"));
        let envelope = Envelope::failure("offline copy");

        let path = storage.write_snapshot(&envelope).unwrap();
        assert!(path.starts_with(storage.root_dir()));
        assert!(!path.with_extension("tmp").exists());

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Envelope = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, envelope);
    }
}
