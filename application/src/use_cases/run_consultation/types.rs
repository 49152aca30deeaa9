//! Types for the consultation use case: inputs, outcomes, errors.

use council_domain::{Case, ConsultationSession, DomainError, SessionId, SpecialistId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors that escape a consultation.
///
/// Per-specialist faults never appear here; they are recorded as opinion
/// statuses on the session.
#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Invalid case: {0}")]
    InvalidCase(DomainError),

    #[error(
        "No specialist produced a usable opinion ({} attempted: {})",
        .attempted.len(),
        join_ids(.attempted)
    )]
    ConsultationFailed {
        session: Box<ConsultationSession>,
        attempted: Vec<SpecialistId>,
    },

    #[error("Consultation cancelled")]
    Cancelled {
        /// Session as it stood when cancellation was observed
        session: Option<Box<ConsultationSession>>,
    },

    #[error("Session state error: {0}")]
    State(#[from] DomainError),

    #[error("Background completion failed: {0}")]
    Background(String),
}

impl ConsultationError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConsultationError::Cancelled { .. })
    }

    /// The session the error refers to, if one was created.
    pub fn session(&self) -> Option<&ConsultationSession> {
        match self {
            ConsultationError::ConsultationFailed { session, .. } => Some(&**session),
            ConsultationError::Cancelled { session } => session.as_deref(),
            _ => None,
        }
    }
}

fn join_ids(ids: &[SpecialistId]) -> String {
    ids.iter()
        .map(SpecialistId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Delivery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationMode {
    /// Return after triage; finish in the background
    Fast,
    /// Return the completed session
    #[default]
    Normal,
}

impl ConsultationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationMode::Fast => "fast",
            ConsultationMode::Normal => "normal",
        }
    }
}

impl fmt::Display for ConsultationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsultationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(ConsultationMode::Fast),
            "normal" | "full" => Ok(ConsultationMode::Normal),
            other => Err(format!("unknown consultation mode: {}", other)),
        }
    }
}

/// Input for the RunConsultation use case
#[derive(Debug, Clone)]
pub struct RunConsultationInput {
    pub case: Case,
    pub mode: ConsultationMode,
    /// Session this consultation re-assesses
    pub follow_up_of: Option<SessionId>,
}

impl RunConsultationInput {
    pub fn new(case: Case) -> Self {
        Self {
            case,
            mode: ConsultationMode::default(),
            follow_up_of: None,
        }
    }

    pub fn with_mode(mut self, mode: ConsultationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn following(mut self, original: SessionId) -> Self {
        self.follow_up_of = Some(original);
        self
    }
}

/// Handle on a fast-mode consultation still running in the background.
#[derive(Debug)]
pub struct BackgroundCompletion {
    handle: JoinHandle<Result<ConsultationSession, ConsultationError>>,
}

impl BackgroundCompletion {
    pub(super) fn new(handle: JoinHandle<Result<ConsultationSession, ConsultationError>>) -> Self {
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the completed session.
    pub async fn wait(self) -> Result<ConsultationSession, ConsultationError> {
        self.handle
            .await
            .map_err(|e| ConsultationError::Background(e.to_string()))?
    }
}

/// What a consultation returns to its caller.
#[derive(Debug)]
pub enum ConsultationOutcome {
    /// Normal mode: conference and synthesis done
    Completed(ConsultationSession),
    /// Fast mode: triage done, the rest in flight
    Partial {
        session: ConsultationSession,
        completion: BackgroundCompletion,
    },
}

impl ConsultationOutcome {
    pub fn session(&self) -> &ConsultationSession {
        match self {
            ConsultationOutcome::Completed(session) => session,
            ConsultationOutcome::Partial { session, .. } => session,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, ConsultationOutcome::Partial { .. })
    }

    /// The completed session, waiting for the background work if needed.
    pub async fn into_completed(self) -> Result<ConsultationSession, ConsultationError> {
        match self {
            ConsultationOutcome::Completed(session) => Ok(session),
            ConsultationOutcome::Partial { completion, .. } => completion.wait().await,
        }
    }
}
