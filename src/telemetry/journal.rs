//! # Action Journal
//!
//! Appends one JSON object per click:
//!
//! ```text
//! {"timestamp":"2026-03-01T12:00:00.123Z","action":"left_click","differential":14}
//! ```
//!
//! Writes are synchronous and flushed per entry so the file stays complete
//! if the process is killed. A failed write is logged and the entry dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::engine::classifier::ClickAction;
use crate::error::Result;

/// One journal line.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    #[serde(serialize_with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    pub action: ClickAction,
    pub differential: i32,
}

fn rfc3339_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Append-only JSONL writer.
pub struct ActionJournal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: u64,
}

impl ActionJournal {
    /// Open (or create) the journal, creating parent directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Action journal: {}", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries written since open.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Record a click at the current wall-clock time.
    pub fn record(&mut self, action: ClickAction, differential: i32) {
        self.record_entry(&JournalEntry {
            timestamp: Utc::now(),
            action,
            differential,
        });
    }

    pub fn record_entry(&mut self, entry: &JournalEntry) {
        if let Err(e) = self.write_line(entry) {
            warn!("Failed to write action journal {}: {}", self.path.display(), e);
            return;
        }
        self.entries += 1;
    }

    fn write_line(&mut self, entry: &JournalEntry) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_entry_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.jsonl");
        let mut journal = ActionJournal::open(&path).unwrap();

        journal.record_entry(&JournalEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            action: ClickAction::Double,
            differential: 22,
        });

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "{\"timestamp\":\"2026-03-01T12:00:00.000Z\",\"action\":\"double_click\",\"differential\":22}\n"
        );
    }

    #[test]
    fn test_record_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.jsonl");
        let mut journal = ActionJournal::open(&path).unwrap();

        journal.record(ClickAction::Left, 12);
        journal.record(ClickAction::Right, -14);
        assert_eq!(journal.entries(), 2);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["action"], "left_click");
        assert_eq!(lines[0]["differential"], 12);
        assert_eq!(lines[1]["action"], "right_click");
        assert_eq!(lines[1]["differential"], -14);
        assert!(lines[1]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_reopen_keeps_existing_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.jsonl");

        ActionJournal::open(&path).unwrap().record(ClickAction::Left, 11);
        ActionJournal::open(&path).unwrap().record(ClickAction::Left, 13);

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("nested").join("actions.jsonl");

        let journal = ActionJournal::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(journal.path(), path.as_path());
    }

    #[test]
    fn test_open_fails_on_directory() {
        let dir = TempDir::new().unwrap();
        assert!(ActionJournal::open(dir.path()).is_err());
    }
}
