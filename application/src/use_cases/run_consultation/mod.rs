//! Run Consultation use case
//!
//! Orchestrates one consultation: Router → Dispatcher → Conference →
//! Synthesis.
//!
//! # Modes
//!
//! - **Normal**: every selected specialist is consulted concurrently, then
//!   conference and synthesis run before the completed session is returned.
//! - **Fast**: only triage runs in the foreground. The caller gets the
//!   `dispatched` session straight away while the rest of the work continues
//!   in a background task, which writes the completed session over the same
//!   cache entry (same case fingerprint, one entry).
//!
//! Per-specialist faults are recorded as opinion statuses. The only failures
//! surfaced to the caller are zero successful opinions and cancellation.

mod dispatch;
pub mod response;
mod routing;
pub mod types;

pub use response::{ConsultationResponse, MissingSpecialist, ResponseStatus};
pub use types::{
    BackgroundCompletion, ConsultationError, ConsultationMode, ConsultationOutcome,
    RunConsultationInput,
};

use crate::config::ConsultationParams;
use crate::ports::consultation_cache::{ConsultationCache, write_session};
use crate::ports::progress::{ConsultationProgress, NoProgress, Stage};
use crate::ports::reward_sink::{NoRewards, OutcomeSignal, RewardSink};
use crate::ports::session_repository::SessionRepository;
use crate::ports::specialist::ConsultContext;
use crate::specialist_table::SpecialistTable;
use crate::use_cases::shared::check_cancelled;
use council_domain::synthesis::synthesize;
use council_domain::{
    CaseFingerprint, ConferenceRecord, ConsultationSession, HistorySnapshot, SessionStatus,
    SpecialistId, SpecialistOpinion,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running a consultation
#[derive(Clone)]
pub struct RunConsultationUseCase {
    table: Arc<SpecialistTable>,
    cache: Arc<dyn ConsultationCache>,
    repository: Arc<dyn SessionRepository>,
    rewards: Arc<dyn RewardSink>,
    params: ConsultationParams,
    cancellation_token: Option<CancellationToken>,
}

impl RunConsultationUseCase {
    pub fn new(
        table: Arc<SpecialistTable>,
        cache: Arc<dyn ConsultationCache>,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            table,
            cache,
            repository,
            rewards: Arc::new(NoRewards),
            params: ConsultationParams::default(),
            cancellation_token: None,
        }
    }

    pub fn with_rewards(mut self, rewards: Arc<dyn RewardSink>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_params(mut self, params: ConsultationParams) -> Self {
        self.params = params;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn table(&self) -> &SpecialistTable {
        &self.table
    }

    pub fn params(&self) -> &ConsultationParams {
        &self.params
    }

    /// Latest cached session for a case fingerprint.
    pub async fn cached_session(&self, fingerprint: &CaseFingerprint) -> Option<ConsultationSession> {
        self.cache.get(fingerprint).await.map(|entry| entry.session)
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunConsultationInput,
    ) -> Result<ConsultationOutcome, ConsultationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    ///
    /// Progress is only reported for foreground work; a fast-mode background
    /// completion runs silently.
    pub async fn execute_with_progress(
        &self,
        input: RunConsultationInput,
        progress: &dyn ConsultationProgress,
    ) -> Result<ConsultationOutcome, ConsultationError> {
        input.case.validate().map_err(ConsultationError::InvalidCase)?;
        check_cancelled(&self.cancellation_token)?;

        info!(case_id = %input.case.id(), mode = %input.mode, "Starting consultation");

        let history = Arc::new(self.load_history().await);
        let triage_deadline = match input.mode {
            ConsultationMode::Fast => self.params.fast_path_deadline,
            ConsultationMode::Normal => self.params.specialist_timeout,
        };
        let case = Arc::new(input.case);
        let context = ConsultContext::new(triage_deadline).with_history(Arc::clone(&history));
        let routed = routing::route(&self.table, Arc::clone(&case), context, progress).await;

        let unavailable: Vec<SpecialistId> = routed
            .decision
            .unavailable_specialists
            .iter()
            .cloned()
            .collect();
        let mut session = ConsultationSession::new(case.as_ref().clone(), routed.decision);
        if let Some(original) = input.follow_up_of {
            session = session.with_follow_up_of(original);
        }
        session.record_opinion(routed.triage);
        for id in unavailable {
            session.record_opinion(SpecialistOpinion::unavailable(id));
        }
        session.transition(
            SessionStatus::Dispatched,
            Some(format!("{} mode", input.mode)),
        )?;

        match input.mode {
            ConsultationMode::Fast => {
                self.write_cache(&session).await;
                let this = self.clone();
                let background = session.clone();
                let handle = tokio::spawn(async move {
                    this.complete(background, history, &NoProgress).await
                });
                info!(
                    session_id = %session.id(),
                    "Returning partial session; completion continues in background"
                );
                Ok(ConsultationOutcome::Partial {
                    session,
                    completion: BackgroundCompletion::new(handle),
                })
            }
            ConsultationMode::Normal => self
                .complete(session, history, progress)
                .await
                .map(ConsultationOutcome::Completed),
        }
    }

    /// Dispatch the remaining specialists, then conference and synthesis.
    async fn complete(
        &self,
        mut session: ConsultationSession,
        history: Arc<HistorySnapshot>,
        progress: &dyn ConsultationProgress,
    ) -> Result<ConsultationSession, ConsultationError> {
        let targets: Vec<SpecialistId> = session
            .routing()
            .map(|r| {
                r.selected_specialists
                    .iter()
                    .filter(|id| session.opinion(id).is_none())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Snapshot taken once, before fan-out
        let prior: Vec<SpecialistOpinion> = session.successful_opinions().cloned().collect();
        let context = ConsultContext::new(self.params.specialist_timeout)
            .with_prior_answers(prior)
            .with_history(history);

        let outcome = dispatch::dispatch(
            &self.table,
            Arc::new(session.case().clone()),
            &targets,
            context,
            &self.params,
            self.cancellation_token.as_ref(),
            progress,
        )
        .await;

        for opinion in outcome.opinions {
            let id = opinion.specialist_id.clone();
            if !session.record_opinion(opinion) {
                debug!(specialist = %id, "duplicate opinion ignored");
            }
        }

        if outcome.cancelled {
            warn!(session_id = %session.id(), "Consultation cancelled");
            self.persist(&session).await;
            return Err(ConsultationError::Cancelled {
                session: Some(Box::new(session)),
            });
        }

        if session.success_count() == 0 {
            let attempted: Vec<SpecialistId> = session.opinions().keys().cloned().collect();
            warn!(
                session_id = %session.id(),
                attempted = attempted.len(),
                "No specialist produced a usable opinion"
            );
            session.transition(
                SessionStatus::Failed,
                Some("no specialist produced a usable opinion".to_string()),
            )?;
            self.emit_outcomes(&session);
            self.persist(&session).await;
            return Err(ConsultationError::ConsultationFailed {
                session: Box::new(session),
                attempted,
            });
        }

        progress.on_stage_start(Stage::Conference, 1);
        let record = ConferenceRecord::conduct(session.opinions().values(), self.table.directory());
        debug!(
            dialogue = record.dialogue.len(),
            disagreements = record.disagreements.len(),
            emergent = record.emergent_findings.len(),
            "Conference complete"
        );
        progress.on_stage_complete(Stage::Conference);

        progress.on_stage_start(Stage::Synthesis, 1);
        let plan = synthesize(&session, &record);
        session.attach_conference(record);
        session.transition(SessionStatus::Conferenced, None)?;
        session.attach_plan(plan);
        session.transition(SessionStatus::Synthesized, None)?;
        progress.on_stage_complete(Stage::Synthesis);

        info!(
            session_id = %session.id(),
            successes = session.success_count(),
            participants = session.participating_specialists().len(),
            "Consultation synthesized"
        );

        self.emit_outcomes(&session);
        self.persist(&session).await;
        Ok(session)
    }

    async fn load_history(&self) -> HistorySnapshot {
        match self.repository.history_snapshot().await {
            Ok(history) => history,
            Err(e) => {
                warn!("Track records unavailable, scoring without history: {}", e);
                HistorySnapshot::default()
            }
        }
    }

    async fn write_cache(&self, session: &ConsultationSession) {
        if let Err(e) =
            write_session(self.cache.as_ref(), session, self.params.cache_write_retries).await
        {
            warn!(fingerprint = %session.fingerprint(), "Cache write failed: {}", e);
        }
    }

    async fn persist(&self, session: &ConsultationSession) {
        self.write_cache(session).await;
        if let Err(e) = self.repository.save_session(session).await {
            warn!(session_id = %session.id(), "Failed to save session: {}", e);
        }
    }

    fn emit_outcomes(&self, session: &ConsultationSession) {
        for opinion in session.opinions().values() {
            let signal = if opinion.is_success() {
                OutcomeSignal::Contributed {
                    confidence: opinion.confidence,
                }
            } else {
                OutcomeSignal::Failed {
                    status: opinion.status,
                }
            };
            self.rewards.emit_outcome(&opinion.specialist_id, &signal);
        }
        if let Some(record) = session.conference() {
            for finding in &record.emergent_findings {
                for id in &finding.discovered_by {
                    self.rewards.emit_outcome(
                        id,
                        &OutcomeSignal::Corroborated {
                            finding: finding.finding.clone(),
                        },
                    );
                }
            }
        }
    }
}
