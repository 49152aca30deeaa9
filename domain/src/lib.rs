//! Domain layer for case-council
//!
//! This crate contains the core consultation logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns and no
//! async runtime: everything here is a pure function of its inputs.
//!
//! # Core Concepts
//!
//! ## Consultation
//!
//! A [`Case`] is routed to a set of specialists, each of which returns one
//! structured [`SpecialistOpinion`]. The opinions are reconciled in two pure
//! passes:
//!
//! - **Conference**: inter-specialist dialogue, disagreements, emergent findings
//! - **Synthesis**: one three-phase plan with safety flags and a confidence breakdown
//!
//! ## Monitoring
//!
//! A [`ProgressUpdate`] at a checkpoint is assessed against the case baseline
//! and may trigger a re-assessment in a linked follow-on session.

pub mod conference;
pub mod confidence;
pub mod config;
pub mod core;
pub mod milestone;
pub mod routing;
pub mod session;
pub mod specialist;
pub mod synthesis;

// Re-export commonly used types
pub use conference::{ConferenceRecord, DialogueEntry, Disagreement, EmergentFinding, Impact, Novelty};
pub use confidence::{
    ConfidenceFactors, ConfidenceModel, ConfidenceSignals, HistorySnapshot, TrackRecord,
};
pub use config::{ConfigIssue, ConfigIssueCode, IssueSeverity, OutputFormat};
pub use core::{
    case::{Case, CaseFingerprint, CaseId},
    error::DomainError,
    urgency::Urgency,
};
pub use milestone::{
    MetricDirection, MetricProgress, MetricRule, MilestoneAssessment, MilestonePolicy,
    MilestoneReport, ProgressStatus, ProgressUpdate,
};
pub use routing::{RoutingDecision, Selection};
pub use session::{ConsultationSession, SessionId, SessionStatus, StatusTransition};
pub use specialist::{
    KeyFinding, OpinionStatus, Priority, QuestionForOther, RiskAssessment, RiskLevel, Severity,
    SpecialistDirectory, SpecialistId, SpecialistOpinion, SpecialistProfile,
};
pub use synthesis::{ClinicalFlags, RedFlag, SynthesizedPlan, TreatmentPhase};
