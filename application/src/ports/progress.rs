//! Progress notification port
//!
//! Defines the interface for reporting progress during a consultation.

use council_domain::{OpinionStatus, SpecialistId};
use std::fmt;

/// Stage of a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Triage,
    Dispatch,
    Conference,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Triage => "triage",
            Stage::Dispatch => "dispatch",
            Stage::Conference => "conference",
            Stage::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Callback for progress updates during a consultation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait ConsultationProgress: Send + Sync {
    /// Called when a stage starts
    fn on_stage_start(&self, stage: Stage, total_tasks: usize);

    /// Called when a specialist answers (or fails to) within a stage
    fn on_specialist_complete(&self, stage: Stage, specialist: &SpecialistId, status: OpinionStatus);

    /// Called when a stage completes
    fn on_stage_complete(&self, stage: Stage);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ConsultationProgress for NoProgress {
    fn on_stage_start(&self, _stage: Stage, _total_tasks: usize) {}
    fn on_specialist_complete(
        &self,
        _stage: Stage,
        _specialist: &SpecialistId,
        _status: OpinionStatus,
    ) {
    }
    fn on_stage_complete(&self, _stage: Stage) {}
}
