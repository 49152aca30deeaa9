//! JSONL file writer for specialist outcome events.
//!
//! Each [`OutcomeSignal`] is serialized as a single JSON line with a `type`
//! field, the specialist id and a `timestamp`, appended to the file via a
//! buffered writer.

use council_application::{OutcomeSignal, RewardSink};
use council_domain::SpecialistId;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Outcome sink that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlRewardSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlRewardSink {
    /// Open the sink at the given path, appending to an existing file.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create outcome log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open outcome log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RewardSink for JsonlRewardSink {
    fn emit_outcome(&self, specialist: &SpecialistId, signal: &OutcomeSignal) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Ok(serde_json::Value::Object(mut record)) = serde_json::to_value(signal) else {
            return;
        };
        record.remove("signal");
        record.insert(
            "type".to_string(),
            serde_json::Value::String(signal.kind().to_string()),
        );
        record.insert(
            "specialist_id".to_string(),
            serde_json::Value::String(specialist.to_string()),
        );
        record.insert(
            "timestamp".to_string(),
            serde_json::Value::String(timestamp),
        );

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Outcomes are append-only; flush each one
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlRewardSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
