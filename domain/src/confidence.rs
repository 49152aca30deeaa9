//! Confidence model
//!
//! A pure scoring service. Specialists use it for self-reported confidence;
//! the orchestrator uses [`ConfidenceModel::aggregate`] and
//! [`ConfidenceFactors`] for the plan-level figure. Experience and accuracy
//! come from an immutable [`HistorySnapshot`] taken before fan-out, never
//! from counters kept inside a specialist.

use crate::specialist::SpecialistId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Past performance of one specialist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Sessions this specialist contributed a successful opinion to
    pub assessments: u32,
    /// Of those, sessions whose plan was later reported on track
    pub on_track_outcomes: u32,
}

impl TrackRecord {
    /// Fraction of evaluated plans that went well, if any were evaluated.
    pub fn accuracy(&self) -> Option<f64> {
        if self.assessments == 0 {
            None
        } else {
            Some((self.on_track_outcomes as f64 / self.assessments as f64).clamp(0.0, 1.0))
        }
    }
}

/// Read-only snapshot of every specialist's track record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    records: BTreeMap<SpecialistId, TrackRecord>,
}

impl HistorySnapshot {
    pub fn new(records: BTreeMap<SpecialistId, TrackRecord>) -> Self {
        Self { records }
    }

    /// Tally records from past sessions.
    ///
    /// Each item is a session's contributing specialists and whether its plan
    /// was ever reported on track.
    pub fn tally<I, C>(sessions: I) -> Self
    where
        I: IntoIterator<Item = (C, bool)>,
        C: IntoIterator<Item = SpecialistId>,
    {
        let mut records: BTreeMap<SpecialistId, TrackRecord> = BTreeMap::new();
        for (contributors, on_track) in sessions {
            for id in contributors {
                let record = records.entry(id).or_default();
                record.assessments += 1;
                if on_track {
                    record.on_track_outcomes += 1;
                }
            }
        }
        Self { records }
    }

    pub fn record(&self, id: &SpecialistId) -> TrackRecord {
        self.records.get(id).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Inputs to a confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSignals {
    /// How well the case matches the specialist's domain (0..1)
    pub domain_match: f64,
    /// Number of prior assessments
    pub prior_assessments: u32,
    /// Historical accuracy (0..1), `None` when there is no history
    pub historical_accuracy: Option<f64>,
}

impl ConfidenceSignals {
    pub fn from_record(domain_match: f64, record: TrackRecord) -> Self {
        Self {
            domain_match,
            prior_assessments: record.assessments,
            historical_accuracy: record.accuracy(),
        }
    }
}

/// Combines domain match, experience and accuracy into a bounded score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceModel {
    pub domain_weight: f64,
    pub experience_weight: f64,
    pub accuracy_weight: f64,
    /// Assessments after which experience saturates
    pub experience_saturation: u32,
    /// Accuracy assumed when there is no history
    pub neutral_accuracy: f64,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            domain_weight: 0.5,
            experience_weight: 0.2,
            accuracy_weight: 0.3,
            experience_saturation: 50,
            neutral_accuracy: 0.5,
        }
    }
}

impl ConfidenceModel {
    /// Score in `[0, 1]`.
    pub fn score(&self, signals: &ConfidenceSignals) -> f64 {
        let domain = signals.domain_match.clamp(0.0, 1.0);
        let experience = if self.experience_saturation == 0 {
            1.0
        } else {
            (signals.prior_assessments.min(self.experience_saturation) as f64)
                / self.experience_saturation as f64
        };
        let accuracy = signals
            .historical_accuracy
            .unwrap_or(self.neutral_accuracy)
            .clamp(0.0, 1.0);

        let total = self.domain_weight + self.experience_weight + self.accuracy_weight;
        if total <= f64::EPSILON {
            return 0.0;
        }
        ((self.domain_weight * domain
            + self.experience_weight * experience
            + self.accuracy_weight * accuracy)
            / total)
            .clamp(0.0, 1.0)
    }

    /// Mean of the given scores, 0 when empty.
    pub fn aggregate(scores: impl IntoIterator<Item = f64>) -> f64 {
        let (sum, n) = scores
            .into_iter()
            .fold((0.0, 0usize), |(s, n), x| (s + x.clamp(0.0, 1.0), n + 1));
        if n == 0 { 0.0 } else { sum / n as f64 }
    }
}

/// Weight of data completeness in the overall plan confidence.
pub const COMPLETENESS_WEIGHT: f64 = 0.3;
/// Weight of inter-agent agreement in the overall plan confidence.
pub const AGREEMENT_WEIGHT: f64 = 0.3;
/// Weight of evidence quality in the overall plan confidence.
pub const EVIDENCE_WEIGHT: f64 = 0.4;

/// Confidence breakdown attached to a synthesized plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub data_completeness: f64,
    pub inter_agent_agreement: f64,
    pub evidence_quality: f64,
    pub overall: f64,
}

impl ConfidenceFactors {
    /// Overall = 0.3 completeness + 0.3 agreement + 0.4 evidence, each clamped to `[0, 1]`.
    pub fn new(data_completeness: f64, inter_agent_agreement: f64, evidence_quality: f64) -> Self {
        let data_completeness = data_completeness.clamp(0.0, 1.0);
        let inter_agent_agreement = inter_agent_agreement.clamp(0.0, 1.0);
        let evidence_quality = evidence_quality.clamp(0.0, 1.0);
        let overall = (COMPLETENESS_WEIGHT * data_completeness
            + AGREEMENT_WEIGHT * inter_agent_agreement
            + EVIDENCE_WEIGHT * evidence_quality)
            .clamp(0.0, 1.0);
        Self {
            data_completeness,
            inter_agent_agreement,
            evidence_quality,
            overall,
        }
    }
}
