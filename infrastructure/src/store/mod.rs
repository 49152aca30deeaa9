//! Session repository adapters
//!
//! Both stores keep a session together with its milestone reports. Reports
//! are append-only; saving a session again never touches them.

mod file_store;
mod memory;

pub use file_store::FileSessionStore;
pub use memory::InMemorySessionStore;

use council_application::RepositoryError;
use council_domain::{ConsultationSession, MilestoneReport, ProgressStatus, SpecialistId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed session record {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for RepositoryError {
    fn from(e: StoreError) -> Self {
        RepositoryError::Storage(e.to_string())
    }
}

/// What one store entry holds: the session and its reports in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub session: ConsultationSession,
    #[serde(default)]
    pub reports: Vec<MilestoneReport>,
}

impl StoredSession {
    pub fn new(session: ConsultationSession) -> Self {
        Self {
            session,
            reports: Vec::new(),
        }
    }

    /// Specialists that contributed, and whether any checkpoint was on track.
    fn track_entry(&self) -> (Vec<SpecialistId>, bool) {
        let on_track = self
            .reports
            .iter()
            .any(|r| r.progress_status == ProgressStatus::OnTrack);
        (self.session.responded_specialists(), on_track)
    }
}
