//! JSON-file session repository
//!
//! One file per session (`<dir>/<session-id>.json`) holding
//! `{"session": ..., "reports": [...]}`. Writes go to a temporary file that
//! is renamed into place, so a crash never leaves a half-written record.

use super::{StoreError, StoredSession};
use async_trait::async_trait;
use council_application::{RepositoryError, SessionRepository};
use council_domain::{ConsultationSession, HistorySnapshot, MilestoneReport, SessionId};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub struct FileSessionStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &SessionId) -> PathBuf {
        let name: String = id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<StoredSession>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write_record(&self, path: &Path, record: &StoredSession) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn all_records(&self) -> Result<Vec<StoredSession>, StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session record"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl SessionRepository for FileSessionStore {
    async fn save_session(&self, session: &ConsultationSession) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(session.id());
        let record = match self.read_record(&path).await? {
            Some(mut existing) => {
                existing.session = session.clone();
                existing
            }
            None => StoredSession::new(session.clone()),
        };
        self.write_record(&path, &record).await?;
        debug!(session_id = %session.id(), status = %session.status(), path = %path.display(), "session saved");
        Ok(())
    }

    async fn load_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<ConsultationSession>, RepositoryError> {
        let record = self.read_record(&self.path_for(id)).await?;
        Ok(record.map(|r| r.session))
    }

    async fn append_report(&self, report: &MilestoneReport) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(&report.session_id);
        let mut record = self
            .read_record(&path)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(report.session_id.clone()))?;
        record.reports.push(report.clone());
        self.write_record(&path, &record).await?;
        debug!(
            session_id = %report.session_id,
            checkpoint_day = report.checkpoint_day,
            reports = record.reports.len(),
            "milestone report appended"
        );
        Ok(())
    }

    async fn reports(&self, id: &SessionId) -> Result<Vec<MilestoneReport>, RepositoryError> {
        let record = self.read_record(&self.path_for(id)).await?;
        Ok(record.map(|r| r.reports).unwrap_or_default())
    }

    async fn history_snapshot(&self) -> Result<HistorySnapshot, RepositoryError> {
        let records = self.all_records().await?;
        Ok(HistorySnapshot::tally(
            records.iter().map(StoredSession::track_entry),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use council_domain::{
        Case, MilestonePolicy, ProgressUpdate, RoutingDecision, SpecialistDirectory, SpecialistId,
        SpecialistOpinion, milestone::assess,
    };
    use std::sync::Arc;

    fn session() -> ConsultationSession {
        let case = Case::new("case/42")
            .with_query("knee pain")
            .with_baseline("pain", 8.0);
        let routing = RoutingDecision::fallback(
            &case,
            &SpecialistDirectory::default(),
            &[SpecialistId::new("physio")],
            "test",
        );
        let mut session = ConsultationSession::new(case, routing);
        session.record_opinion(SpecialistOpinion::success("physio", "musculoskeletal", 0.8));
        session.record_opinion(SpecialistOpinion::failed(
            SpecialistId::new("pain"),
            "pain",
            "boom",
        ));
        session
    }

    fn report(session: &ConsultationSession, pain: f64) -> MilestoneReport {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", pain)
            .with_adherence(0.9);
        let assessment = assess(
            session.case().baseline_metrics(),
            &update,
            &MilestonePolicy::default(),
        );
        MilestoneReport::new(session.id().clone(), &update, assessment, 14)
    }

    async fn exercise(repo: Arc<dyn SessionRepository>) {
        let s = session();
        repo.save_session(&s).await.unwrap();

        let loaded = repo.load_session(s.id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), s.id());
        assert_eq!(loaded.status(), s.status());
        assert_eq!(loaded.responded_specialists(), s.responded_specialists());

        repo.append_report(&report(&s, 5.0)).await.unwrap();
        repo.append_report(&report(&s, 7.5)).await.unwrap();

        // Re-saving the session keeps earlier reports untouched
        repo.save_session(&s).await.unwrap();
        let reports = repo.reports(s.id()).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].progress_metrics["pain"], 5.0);

        let history = repo.history_snapshot().await.unwrap();
        let physio = history.record(&SpecialistId::new("physio"));
        assert_eq!(physio.assessments, 1);
        assert_eq!(physio.on_track_outcomes, 1);
        assert_eq!(history.record(&SpecialistId::new("pain")).assessments, 0);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path().join("sessions")).await.unwrap();
        exercise(Arc::new(store)).await;
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        exercise(Arc::new(InMemorySessionStore::new())).await;
    }

    #[tokio::test]
    async fn test_unsafe_id_characters_stay_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let path = store.path_for(&SessionId::new("../etc/passwd"));
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let id = SessionId::new("nope");

        assert!(store.load_session(&id).await.unwrap().is_none());
        assert!(store.reports(&id).await.unwrap().is_empty());

        let s = session();
        let err = store.append_report(&report(&s, 5.0)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_skipped_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        store.save_session(&session()).await.unwrap();
        std::fs::write(dir.path().join("garbage.json"), "{not json").unwrap();

        let history = store.history_snapshot().await.unwrap();
        assert_eq!(history.record(&SpecialistId::new("physio")).assessments, 1);
    }
}
