//! Hand-written port doubles shared by the use case tests.

use crate::ports::consultation_cache::{CacheEntry, CacheError, ConsultationCache};
use crate::ports::reward_sink::{OutcomeSignal, RewardSink};
use crate::ports::session_repository::{RepositoryError, SessionRepository};
use crate::ports::specialist::{ConsultContext, SpecialistError, SpecialistPort};
use async_trait::async_trait;
use council_domain::{
    Case, CaseFingerprint, ConsultationSession, HistorySnapshot, MilestoneReport, ProgressStatus,
    SessionId, SpecialistId, SpecialistOpinion, SpecialistProfile,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted specialist does when consulted.
#[derive(Clone)]
pub enum Script {
    Respond(SpecialistOpinion),
    /// Respond after sleeping (tokio time, so paused clocks auto-advance)
    Slow(Duration, SpecialistOpinion),
    Fail(String),
    Panic,
}

pub struct ScriptedSpecialist {
    profile: SpecialistProfile,
    script: Script,
    pub seen_prior_answers: Mutex<Vec<usize>>,
}

impl ScriptedSpecialist {
    pub fn new(profile: SpecialistProfile, script: Script) -> Self {
        Self {
            profile,
            script,
            seen_prior_answers: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpecialistPort for ScriptedSpecialist {
    fn profile(&self) -> &SpecialistProfile {
        &self.profile
    }

    async fn consult(
        &self,
        _case: &Case,
        context: &ConsultContext,
    ) -> Result<SpecialistOpinion, SpecialistError> {
        self.seen_prior_answers
            .lock()
            .unwrap()
            .push(context.prior_answers.len());
        match &self.script {
            Script::Respond(opinion) => Ok(opinion.clone()),
            Script::Slow(delay, opinion) => {
                tokio::time::sleep(*delay).await;
                Ok(opinion.clone())
            }
            Script::Fail(reason) => Err(SpecialistError::Failed(reason.clone())),
            Script::Panic => panic!("scripted panic"),
        }
    }
}

/// Versioned in-memory cache that counts writes.
#[derive(Default)]
pub struct MockCache {
    entries: Mutex<HashMap<CaseFingerprint, CacheEntry>>,
    pub writes: Mutex<usize>,
}

#[async_trait]
impl ConsultationCache for MockCache {
    async fn get(&self, fingerprint: &CaseFingerprint) -> Option<CacheEntry> {
        self.entries.lock().unwrap().get(fingerprint).cloned()
    }

    async fn compare_and_swap(
        &self,
        expected: Option<u64>,
        session: ConsultationSession,
    ) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let found = entries.get(session.fingerprint()).map(|e| e.version);
        if found != expected {
            return Err(CacheError::WriteConflict {
                fingerprint: session.fingerprint().to_string(),
                expected,
                found,
            });
        }
        let version = found.unwrap_or(0) + 1;
        entries.insert(
            session.fingerprint().clone(),
            CacheEntry { session, version },
        );
        *self.writes.lock().unwrap() += 1;
        Ok(version)
    }

    async fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[derive(Default)]
pub struct MockRepository {
    pub sessions: Mutex<HashMap<SessionId, ConsultationSession>>,
    pub reports: Mutex<Vec<MilestoneReport>>,
}

#[async_trait]
impl SessionRepository for MockRepository {
    async fn save_session(&self, session: &ConsultationSession) -> Result<(), RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn load_session(
        &self,
        id: &SessionId,
    ) -> Result<Option<ConsultationSession>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn append_report(&self, report: &MilestoneReport) -> Result<(), RepositoryError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn reports(&self, id: &SessionId) -> Result<Vec<MilestoneReport>, RepositoryError> {
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.session_id == id)
            .cloned()
            .collect())
    }

    async fn history_snapshot(&self) -> Result<HistorySnapshot, RepositoryError> {
        let reports = self.reports.lock().unwrap();
        let sessions = self.sessions.lock().unwrap();
        Ok(HistorySnapshot::tally(sessions.values().map(|s| {
            let on_track = reports.iter().any(|r| {
                &r.session_id == s.id() && r.progress_status == ProgressStatus::OnTrack
            });
            (s.responded_specialists(), on_track)
        })))
    }
}

#[derive(Default)]
pub struct RecordingRewards {
    pub events: Mutex<Vec<(SpecialistId, OutcomeSignal)>>,
}

impl RewardSink for RecordingRewards {
    fn emit_outcome(&self, specialist: &SpecialistId, signal: &OutcomeSignal) {
        self.events
            .lock()
            .unwrap()
            .push((specialist.clone(), signal.clone()));
    }
}
