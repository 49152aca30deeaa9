//! Synthesis: one phased plan from a session and its conference record.
//!
//! The plan always has exactly three phases. Safety flags are collected from
//! every escalating key finding, and the confidence breakdown degrades rather
//! than failing when specialists are missing.

mod engine;

pub use engine::synthesize;

use crate::confidence::ConfidenceFactors;
use crate::core::urgency::Urgency;
use crate::specialist::{OpinionStatus, Severity, SpecialistId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of phases in every synthesized plan.
pub const PHASE_COUNT: usize = 3;

/// One phase of the treatment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPhase {
    /// 1-based position
    pub number: u8,
    pub name: String,
    pub timeframe: String,
    pub goals: Vec<String>,
    pub interventions: Vec<String>,
}

/// A finding that requires escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub flag: String,
    pub severity: Severity,
    pub source_specialist: SpecialistId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFlags {
    pub red_flags: Vec<RedFlag>,
    /// True whenever any red flag is high severity or the case is an emergency
    pub requires_immediate_escalation: bool,
    pub urgency_level: Urgency,
}

impl ClinicalFlags {
    pub fn high_severity(&self) -> impl Iterator<Item = &RedFlag> {
        self.red_flags.iter().filter(|f| f.severity == Severity::High)
    }
}

/// The synthesized decision artifact of a consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedPlan {
    pub phases: Vec<TreatmentPhase>,
    pub clinical_flags: ClinicalFlags,
    pub confidence_factors: ConfidenceFactors,
    pub tracking_metrics: Vec<String>,
    pub next_checkpoint_days: u32,
    /// Specialists that were part of the session but did not contribute
    #[serde(default)]
    pub non_contributing: BTreeMap<SpecialistId, OpinionStatus>,
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl SynthesizedPlan {
    pub fn phase(&self, number: u8) -> Option<&TreatmentPhase> {
        self.phases.iter().find(|p| p.number == number)
    }

    /// All interventions in phase order.
    pub fn interventions(&self) -> impl Iterator<Item = &str> {
        self.phases
            .iter()
            .flat_map(|p| p.interventions.iter().map(String::as_str))
    }

    pub fn is_degraded(&self) -> bool {
        !self.non_contributing.is_empty()
    }
}
