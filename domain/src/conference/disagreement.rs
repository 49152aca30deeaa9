//! Disagreement detection across risk and urgency classifications.

use crate::core::string::normalize_phrase;
use crate::core::urgency::Urgency;
use crate::specialist::{Severity, SpecialistId, SpecialistOpinion};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Dimension name used for disagreements about the case's urgency.
pub const URGENCY_DIMENSION: &str = "urgency";

/// Two or more specialists rating the same case dimension high vs low risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disagreement {
    pub topic: String,
    /// Every specialist on either side
    pub specialist_ids: BTreeSet<SpecialistId>,
    /// Specialists rating the topic high risk
    pub elevated: BTreeSet<SpecialistId>,
    /// Specialists rating the topic low risk
    pub reassuring: BTreeSet<SpecialistId>,
    pub severity: Severity,
    pub resolution_note: String,
}

struct Position<'a> {
    specialist: &'a SpecialistId,
    level: Severity,
    escalates: bool,
}

/// Compare risk levels per dimension and tagged urgency across opinions.
///
/// A dimension is in disagreement when at least one specialist rates it
/// `high` and at least one rates it `low`; `moderate` ratings take no side.
pub(super) fn detect_disagreements(
    opinions: &BTreeMap<&SpecialistId, &SpecialistOpinion>,
) -> Vec<Disagreement> {
    // normalized dimension -> (display name, positions)
    let mut dimensions: BTreeMap<String, (String, Vec<Position<'_>>)> = BTreeMap::new();

    for opinion in opinions.values() {
        let escalates = opinion.flags_escalation();
        let mut seen = BTreeSet::new();
        for risk in &opinion.risk_assessments {
            let key = normalize_phrase(&risk.dimension);
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            dimensions
                .entry(key)
                .or_insert_with(|| (risk.dimension.clone(), Vec::new()))
                .1
                .push(Position {
                    specialist: &opinion.specialist_id,
                    level: risk.level,
                    escalates,
                });
        }
        if let Some(urgency) = opinion.urgency {
            dimensions
                .entry(URGENCY_DIMENSION.to_string())
                .or_insert_with(|| (URGENCY_DIMENSION.to_string(), Vec::new()))
                .1
                .push(Position {
                    specialist: &opinion.specialist_id,
                    level: urgency_as_risk(urgency),
                    escalates,
                });
        }
    }

    dimensions
        .into_values()
        .filter_map(|(topic, positions)| classify(topic, &positions))
        .collect()
}

fn urgency_as_risk(urgency: Urgency) -> Severity {
    match urgency {
        Urgency::Routine => Severity::Low,
        Urgency::SemiUrgent => Severity::Moderate,
        Urgency::Urgent | Urgency::Emergency => Severity::High,
    }
}

fn classify(topic: String, positions: &[Position<'_>]) -> Option<Disagreement> {
    let high: Vec<&Position<'_>> = positions
        .iter()
        .filter(|p| p.level == Severity::High)
        .collect();
    let low: Vec<&Position<'_>> = positions
        .iter()
        .filter(|p| p.level == Severity::Low)
        .collect();
    if high.is_empty() || low.is_empty() {
        return None;
    }

    let escalating: BTreeSet<SpecialistId> = high
        .iter()
        .chain(low.iter())
        .filter(|p| p.escalates)
        .map(|p| p.specialist.clone())
        .collect();
    let minority = high.len().min(low.len());

    // Escalation on either side, or a split with at least two on each side,
    // is high; a one-on-one split is moderate; a lone dissenter is low.
    let severity = if !escalating.is_empty() || minority >= 2 {
        Severity::High
    } else if high.len() + low.len() == 2 {
        Severity::Moderate
    } else {
        Severity::Low
    };

    let elevated: BTreeSet<SpecialistId> = high.iter().map(|p| p.specialist.clone()).collect();
    let reassuring: BTreeSet<SpecialistId> = low.iter().map(|p| p.specialist.clone()).collect();
    let resolution_note = resolution_note(&topic, &elevated, &reassuring, &escalating);

    Some(Disagreement {
        specialist_ids: elevated.union(&reassuring).cloned().collect(),
        topic,
        elevated,
        reassuring,
        severity,
        resolution_note,
    })
}

fn join_ids(ids: &BTreeSet<SpecialistId>) -> String {
    ids.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

fn resolution_note(
    topic: &str,
    elevated: &BTreeSet<SpecialistId>,
    reassuring: &BTreeSet<SpecialistId>,
    escalating: &BTreeSet<SpecialistId>,
) -> String {
    if !escalating.is_empty() {
        format!(
            "Escalation flagged by {}: treat {} as high risk until reviewed",
            join_ids(escalating),
            topic
        )
    } else if elevated.len() >= reassuring.len() {
        format!(
            "{} of {} rate {} high risk; confirm with {} before de-escalating",
            elevated.len(),
            elevated.len() + reassuring.len(),
            topic,
            join_ids(reassuring)
        )
    } else {
        format!(
            "{} of {} rate {} low risk; monitor the concern raised by {}",
            reassuring.len(),
            elevated.len() + reassuring.len(),
            topic,
            join_ids(elevated)
        )
    }
}
