//! Coordination conference
//!
//! A post-hoc pass over the gathered opinions. It pairs inter-specialist
//! questions with the target's findings, detects disagreements on risk and
//! urgency, and promotes findings corroborated across domains.
//!
//! The pass is pure: only successful opinions take part, they are visited in
//! specialist-id order, and no state is kept between runs, so the same
//! opinion set always yields the same [`ConferenceRecord`].
//!
//! ```text
//! opinions ──┬── dialogue      (questions_for_others × target findings)
//!            ├── disagreements (risk_assessments + urgency, high vs low)
//!            └── emergent      (same key finding, ≥ 2 specialists, ≥ 2 domains)
//! ```

pub mod dialogue;
pub mod disagreement;
pub mod emergent;

pub use dialogue::{DialogueEntry, Impact};
pub use disagreement::Disagreement;
pub use emergent::{EmergentFinding, Novelty};

use crate::specialist::{Severity, SpecialistDirectory, SpecialistId, SpecialistOpinion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of one conference pass. Always recomputed whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConferenceRecord {
    pub dialogue: Vec<DialogueEntry>,
    pub disagreements: Vec<Disagreement>,
    pub emergent_findings: Vec<EmergentFinding>,
}

impl ConferenceRecord {
    /// Run the conference over a set of opinions.
    ///
    /// Duplicate opinions for one specialist keep the first occurrence.
    pub fn conduct<'a>(
        opinions: impl IntoIterator<Item = &'a SpecialistOpinion>,
        directory: &SpecialistDirectory,
    ) -> Self {
        let mut successful: BTreeMap<&SpecialistId, &SpecialistOpinion> = BTreeMap::new();
        for opinion in opinions.into_iter().filter(|o| o.is_success()) {
            successful.entry(&opinion.specialist_id).or_insert(opinion);
        }

        Self {
            dialogue: dialogue::build_dialogue(&successful),
            disagreements: disagreement::detect_disagreements(&successful),
            emergent_findings: emergent::detect_emergent_findings(&successful, directory),
        }
    }

    pub fn has_high_severity_disagreement(&self) -> bool {
        self.disagreements
            .iter()
            .any(|d| d.severity == Severity::High)
    }

    /// Disagreements at `severity` or above.
    pub fn disagreements_at_least(&self, severity: Severity) -> impl Iterator<Item = &Disagreement> {
        self.disagreements.iter().filter(move |d| d.severity >= severity)
    }

    pub fn is_empty(&self) -> bool {
        self.dialogue.is_empty() && self.disagreements.is_empty() && self.emergent_findings.is_empty()
    }
}
