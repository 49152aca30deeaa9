//! Session store configuration from TOML (`[store]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where consultation sessions and milestone reports are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Directory holding one JSON file per session; `None` keeps sessions in memory
    pub session_dir: Option<PathBuf>,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            session_dir: dirs::data_dir().map(|d| d.join("case-council").join("sessions")),
        }
    }
}
