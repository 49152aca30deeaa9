//! Outcome events port.
//!
//! The orchestrator reports what each specialist's opinion amounted to. What
//! a sink does with it (ledger, rewards, analytics) is not the core's concern.

use council_domain::{OpinionStatus, SpecialistId};
use serde::Serialize;

/// What happened to a specialist's contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum OutcomeSignal {
    /// Successful opinion used in synthesis
    Contributed { confidence: f64 },
    /// Co-discovered an emergent finding
    Corroborated { finding: String },
    /// Did not contribute
    Failed { status: OpinionStatus },
    /// A plan this specialist contributed to was reported on track
    PlanOnTrack { checkpoint_day: u32 },
    /// A plan this specialist contributed to triggered reassessment
    PlanRevised { checkpoint_day: u32 },
}

impl OutcomeSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            OutcomeSignal::Contributed { .. } => "contributed",
            OutcomeSignal::Corroborated { .. } => "corroborated",
            OutcomeSignal::Failed { .. } => "failed",
            OutcomeSignal::PlanOnTrack { .. } => "plan_on_track",
            OutcomeSignal::PlanRevised { .. } => "plan_revised",
        }
    }
}

/// Fire-and-forget outcome notification.
///
/// The `emit_outcome` method is intentionally synchronous and non-fallible:
/// sink failures must never disturb a consultation.
pub trait RewardSink: Send + Sync {
    fn emit_outcome(&self, specialist: &SpecialistId, signal: &OutcomeSignal);
}

/// No-op implementation for tests and when no sink is configured.
pub struct NoRewards;

impl RewardSink for NoRewards {
    fn emit_outcome(&self, _specialist: &SpecialistId, _signal: &OutcomeSignal) {}
}
