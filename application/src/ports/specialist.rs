//! Specialist port
//!
//! Every specialist, whatever produces its opinion, is consulted through
//! [`SpecialistPort`]. Implementations (adapters) live in the infrastructure
//! layer.

use async_trait::async_trait;
use council_domain::{
    Case, ConfidenceModel, ConfidenceSignals, HistorySnapshot, SpecialistId, SpecialistOpinion,
    SpecialistProfile,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a specialist can report.
///
/// The dispatcher turns every one of these into an opinion with a non-success
/// status; none of them abort a consultation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecialistError {
    #[error("Specialist unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Specialist failed: {0}")]
    Failed(String),
}

/// Read-only inputs handed to a specialist alongside the case.
///
/// Taken before fan-out and shared by every specialist in the round, so no
/// specialist can observe another's answer during dispatch.
#[derive(Debug, Clone)]
pub struct ConsultContext {
    /// Opinions recorded before this round (the triage opinion)
    pub prior_answers: Arc<Vec<SpecialistOpinion>>,
    pub history: Arc<HistorySnapshot>,
    /// Time the specialist has to answer
    pub deadline: Duration,
}

impl ConsultContext {
    pub fn new(deadline: Duration) -> Self {
        Self {
            prior_answers: Arc::new(Vec::new()),
            history: Arc::new(HistorySnapshot::default()),
            deadline,
        }
    }

    pub fn with_prior_answers(mut self, answers: Vec<SpecialistOpinion>) -> Self {
        self.prior_answers = Arc::new(answers);
        self
    }

    pub fn with_history(mut self, history: Arc<HistorySnapshot>) -> Self {
        self.history = history;
        self
    }
}

/// An opinion-producing capability.
#[async_trait]
pub trait SpecialistPort: Send + Sync {
    /// Static profile: id, domain, routing keywords
    fn profile(&self) -> &SpecialistProfile;

    fn id(&self) -> &SpecialistId {
        &self.profile().id
    }

    /// Produce this specialist's opinion on `case`.
    async fn consult(
        &self,
        case: &Case,
        context: &ConsultContext,
    ) -> Result<SpecialistOpinion, SpecialistError>;

    /// Self-reported confidence for `case`, from domain match and track record.
    fn confidence(&self, case: &Case, history: &HistorySnapshot) -> f64 {
        let profile = self.profile();
        let signals = ConfidenceSignals::from_record(
            profile.keyword_coverage(&case.text_corpus()),
            history.record(&profile.id),
        );
        ConfidenceModel::default().score(&signals)
    }
}
