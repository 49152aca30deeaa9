//! In-memory session repository, used when no session directory is configured.

use super::StoredSession;
use async_trait::async_trait;
use council_application::{RepositoryError, SessionRepository};
use council_domain::{ConsultationSession, HistorySnapshot, MilestoneReport, SessionId};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySessionStore {
    records: RwLock<BTreeMap<SessionId, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionStore {
    async fn save_session(&self, session: &ConsultationSession) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        match records.get_mut(session.id()) {
            Some(record) => record.session = session.clone(),
            None => {
                records.insert(session.id().clone(), StoredSession::new(session.clone()));
            }
        }
        Ok(())
    }

    async fn load_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<ConsultationSession>, RepositoryError> {
        Ok(self.records.read().await.get(id).map(|r| r.session.clone()))
    }

    async fn append_report(&self, report: &MilestoneReport) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&report.session_id)
            .ok_or_else(|| RepositoryError::NotFound(report.session_id.clone()))?;
        record.reports.push(report.clone());
        Ok(())
    }

    async fn reports(&self, id: &SessionId) -> Result<Vec<MilestoneReport>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .map(|r| r.reports.clone())
            .unwrap_or_default())
    }

    async fn history_snapshot(&self) -> Result<HistorySnapshot, RepositoryError> {
        let records = self.records.read().await;
        Ok(HistorySnapshot::tally(
            records.values().map(StoredSession::track_entry),
        ))
    }
}
