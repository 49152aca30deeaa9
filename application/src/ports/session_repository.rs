//! Session repository port
//!
//! Durable storage for sessions and their milestone reports. Reports are
//! append-only: a new checkpoint never rewrites an earlier one.

use async_trait::async_trait;
use council_domain::{ConsultationSession, HistorySnapshot, MilestoneReport, SessionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert or replace a session.
    async fn save_session(&self, session: &ConsultationSession) -> Result<(), RepositoryError>;

    async fn load_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<ConsultationSession>, RepositoryError>;

    /// Append a report to its session's report list.
    async fn append_report(&self, report: &MilestoneReport) -> Result<(), RepositoryError>;

    async fn reports(&self, id: &SessionId) -> Result<Vec<MilestoneReport>, RepositoryError>;

    /// Per-specialist track records derived from stored sessions.
    async fn history_snapshot(&self) -> Result<HistorySnapshot, RepositoryError>;
}
