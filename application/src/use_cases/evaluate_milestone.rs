//! Evaluate Milestone use case
//!
//! Re-evaluates a synthesized plan at a checkpoint. The original plan is
//! never touched: a checkpoint that calls for reassessment re-routes the
//! updated case into a new session linked back via `follow_up_of`.

use crate::config::MilestonePolicy;
use crate::ports::reward_sink::{NoRewards, OutcomeSignal, RewardSink};
use crate::ports::session_repository::{RepositoryError, SessionRepository};
use crate::use_cases::run_consultation::{
    ConsultationMode, RunConsultationInput, RunConsultationUseCase,
};
use council_domain::milestone::assess;
use council_domain::{
    DomainError, MilestoneReport, ProgressStatus, ProgressUpdate, SessionId, SessionStatus,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum MilestoneError {
    #[error("Invalid progress update: {0}")]
    InvalidProgress(DomainError),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Session {id} has no plan to evaluate (status: {status})")]
    NoPlan { id: SessionId, status: SessionStatus },

    #[error("Session state error: {0}")]
    State(#[from] DomainError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Input for the EvaluateMilestone use case
#[derive(Debug, Clone)]
pub struct EvaluateMilestoneInput {
    pub session_id: SessionId,
    pub update: ProgressUpdate,
}

impl EvaluateMilestoneInput {
    pub fn new(session_id: SessionId, update: ProgressUpdate) -> Self {
        Self { session_id, update }
    }
}

/// Use case for evaluating a checkpoint
pub struct EvaluateMilestoneUseCase {
    repository: Arc<dyn SessionRepository>,
    consultation: RunConsultationUseCase,
    rewards: Arc<dyn RewardSink>,
    policy: MilestonePolicy,
}

impl EvaluateMilestoneUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>, consultation: RunConsultationUseCase) -> Self {
        Self {
            repository,
            consultation,
            rewards: Arc::new(NoRewards),
            policy: MilestonePolicy::default(),
        }
    }

    pub fn with_rewards(mut self, rewards: Arc<dyn RewardSink>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_policy(mut self, policy: MilestonePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute(
        &self,
        input: EvaluateMilestoneInput,
    ) -> Result<MilestoneReport, MilestoneError> {
        let EvaluateMilestoneInput { session_id, update } = input;
        update.validate().map_err(MilestoneError::InvalidProgress)?;

        let mut session = self
            .repository
            .load_session(&session_id)
            .await?
            .ok_or_else(|| MilestoneError::SessionNotFound(session_id.clone()))?;

        let Some(plan) = session.plan().cloned() else {
            return Err(MilestoneError::NoPlan {
                id: session_id,
                status: session.status(),
            });
        };
        if session.status() == SessionStatus::Synthesized {
            session.transition(
                SessionStatus::Monitoring,
                Some(format!("checkpoint day {}", update.checkpoint_day)),
            )?;
            self.repository.save_session(&session).await?;
        }

        let assessment = assess(session.case().baseline_metrics(), &update, &self.policy);
        info!(
            session_id = %session_id,
            checkpoint_day = update.checkpoint_day,
            status = %assessment.progress_status,
            reassessment = assessment.reassessment_triggered,
            "Checkpoint assessed"
        );

        let mut report = MilestoneReport::new(
            session_id.clone(),
            &update,
            assessment,
            plan.next_checkpoint_days,
        );

        if report.reassessment_triggered {
            let follow_up = session.case().follow_up(
                update.checkpoint_day,
                &update.progress_metrics,
                &update.notes(),
            );
            let input = RunConsultationInput::new(follow_up)
                .with_mode(ConsultationMode::Normal)
                .following(session_id.clone());

            match self.consultation.execute(input).await {
                Ok(outcome) => {
                    let follow_on = outcome.session();
                    let recommendations: Vec<String> = follow_on
                        .plan()
                        .map(|p| p.interventions().map(str::to_string).collect())
                        .unwrap_or_default();
                    info!(
                        session_id = %session_id,
                        follow_up = %follow_on.id(),
                        "Reassessment complete"
                    );
                    report = report.with_reassessment(follow_on.id().clone(), recommendations);
                }
                Err(e) => {
                    // The checkpoint itself still stands
                    warn!(session_id = %session_id, "Reassessment failed: {}", e);
                    report.reasons.push(format!("reassessment failed: {}", e));
                }
            }
        }

        self.repository.append_report(&report).await?;

        let signal = if report.progress_status == ProgressStatus::OnTrack
            && !report.reassessment_triggered
        {
            OutcomeSignal::PlanOnTrack {
                checkpoint_day: report.checkpoint_day,
            }
        } else {
            OutcomeSignal::PlanRevised {
                checkpoint_day: report.checkpoint_day,
            }
        };
        for id in session.responded_specialists() {
            self.rewards.emit_outcome(&id, &signal);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsultationParams;
    use crate::ports::consultation_cache::ConsultationCache;
    use crate::ports::specialist::SpecialistPort;
    use crate::specialist_table::SpecialistTable;
    use crate::test_support::{
        MockCache, MockRepository, RecordingRewards, Script, ScriptedSpecialist,
    };
    use council_domain::{
        Case, ConsultationSession, SpecialistId, SpecialistOpinion, SpecialistProfile,
    };
    use std::time::Duration;

    struct Harness {
        use_case: EvaluateMilestoneUseCase,
        consultation: RunConsultationUseCase,
        repository: Arc<MockRepository>,
        rewards: Arc<RecordingRewards>,
    }

    fn harness() -> Harness {
        let triage: Arc<dyn SpecialistPort> = Arc::new(ScriptedSpecialist::new(
            SpecialistProfile::new("triage", "general"),
            Script::Respond(
                SpecialistOpinion::success("triage", "general", 0.6)
                    .with_primary_finding("Back pain"),
            ),
        ));
        let physio: Arc<dyn SpecialistPort> = Arc::new(ScriptedSpecialist::new(
            SpecialistProfile::new("physio", "musculoskeletal").with_keywords(["back pain"]),
            Script::Respond(
                SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                    .with_recommendation("Graded activity program"),
            ),
        ));
        let table = SpecialistTable::new(
            vec![triage, physio],
            SpecialistId::new("triage"),
            vec![SpecialistId::new("physio")],
        )
        .unwrap();
        let repository = Arc::new(MockRepository::default());
        let rewards = Arc::new(RecordingRewards::default());
        let cache: Arc<dyn ConsultationCache> = Arc::new(MockCache::default());
        let consultation = RunConsultationUseCase::new(Arc::new(table), cache, repository.clone())
            .with_params(
                ConsultationParams::default().with_specialist_timeout(Duration::from_millis(100)),
            );
        let use_case = EvaluateMilestoneUseCase::new(repository.clone(), consultation.clone())
            .with_rewards(rewards.clone());
        Harness {
            use_case,
            consultation,
            repository,
            rewards,
        }
    }

    async fn consulted(h: &Harness) -> ConsultationSession {
        let case = Case::new("case-7")
            .with_query("Back pain after lifting")
            .with_baseline("pain", 8.0);
        h.consultation
            .execute(RunConsultationInput::new(case))
            .await
            .unwrap()
            .into_completed()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_on_track_checkpoint_needs_no_reassessment() {
        let h = harness();
        let session = consulted(&h).await;

        let update = ProgressUpdate::new(14)
            .with_metric("pain", 5.0)
            .with_adherence(0.85);
        let report = h
            .use_case
            .execute(EvaluateMilestoneInput::new(session.id().clone(), update))
            .await
            .unwrap();

        assert_eq!(report.progress_status, ProgressStatus::OnTrack);
        assert!(!report.reassessment_triggered);
        assert!(report.adjusted_recommendations.is_empty());
        assert!(report.follow_up_session.is_none());
        // Routine case: 14-day interval
        assert_eq!(report.next_checkpoint_day, 28);

        let stored = h.repository.load_session(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Monitoring);
        assert_eq!(h.repository.reports(session.id()).await.unwrap().len(), 1);

        let events = h.rewards.events.lock().unwrap();
        assert!(
            events
                .iter()
                .all(|(_, s)| matches!(s, OutcomeSignal::PlanOnTrack { checkpoint_day: 14 }))
        );
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_poor_adherence_triggers_linked_follow_up() {
        let h = harness();
        let session = consulted(&h).await;

        let update = ProgressUpdate::new(14)
            .with_metric("pain", 7.0)
            .with_adherence(0.55);
        let report = h
            .use_case
            .execute(EvaluateMilestoneInput::new(session.id().clone(), update))
            .await
            .unwrap();

        assert_eq!(report.progress_status, ProgressStatus::NeedsAttention);
        assert!(report.reassessment_triggered);
        assert!(
            report
                .adjusted_recommendations
                .contains(&"Graded activity program".to_string())
        );

        let follow_up_id = report.follow_up_session.clone().unwrap();
        let follow_up = h.repository.load_session(&follow_up_id).await.unwrap().unwrap();
        assert_eq!(follow_up.follow_up_of(), Some(session.id()));
        assert_eq!(follow_up.case().id().as_str(), "case-7-day14");

        // Original plan untouched
        let original = h.repository.load_session(session.id()).await.unwrap().unwrap();
        assert_eq!(original.plan(), session.plan());
    }

    #[tokio::test]
    async fn test_reports_are_appended_per_checkpoint() {
        let h = harness();
        let session = consulted(&h).await;

        for (day, pain) in [(14, 5.0), (28, 3.0)] {
            let update = ProgressUpdate::new(day)
                .with_metric("pain", pain)
                .with_adherence(0.9);
            h.use_case
                .execute(EvaluateMilestoneInput::new(session.id().clone(), update))
                .await
                .unwrap();
        }

        let reports = h.repository.reports(session.id()).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].checkpoint_day, 14);
        assert_eq!(reports[1].checkpoint_day, 28);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let h = harness();
        let err = h
            .use_case
            .execute(EvaluateMilestoneInput::new(
                SessionId::new("missing"),
                ProgressUpdate::new(7).with_metric("pain", 3.0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, MilestoneError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_update_rejected() {
        let h = harness();
        let session = consulted(&h).await;
        let err = h
            .use_case
            .execute(EvaluateMilestoneInput::new(
                session.id().clone(),
                ProgressUpdate::new(7).with_adherence(2.0),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, MilestoneError::InvalidProgress(_)));
    }
}
