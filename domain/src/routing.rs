//! Routing decisions
//!
//! Pure part of the Router: given the case and the triage opinion (if triage
//! succeeded), classify urgency and pick the minimal sufficient specialist
//! set. Calling the triage specialist is the application layer's job.

use crate::core::case::Case;
use crate::core::urgency::Urgency;
use crate::specialist::{SpecialistDirectory, SpecialistId, SpecialistOpinion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of routing a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub urgency: Urgency,
    /// Never empty
    pub selected_specialists: BTreeSet<SpecialistId>,
    /// Referred to by triage but not registered
    #[serde(default)]
    pub unavailable_specialists: BTreeSet<SpecialistId>,
    /// Fraction of domain-relevant structured fields present (0..1)
    pub data_completeness: f64,
    /// Triage could not be consulted; default routing was used
    #[serde(default)]
    pub triage_failed: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RoutingDecision {
    /// Route from a successful triage opinion.
    pub fn from_triage(
        case: &Case,
        triage: &SpecialistOpinion,
        directory: &SpecialistDirectory,
        triage_id: &SpecialistId,
        defaults: &[SpecialistId],
    ) -> Self {
        let urgency = classify_urgency(case, Some(triage));
        let selection = select_specialists(triage, directory, triage_id, defaults);
        let mut warnings = Vec::new();
        if selection.used_defaults {
            warnings.push("No specialist matched the triage opinion; using defaults".to_string());
        }
        for missing in &selection.unavailable {
            warnings.push(format!("Triage referred to unregistered specialist '{}'", missing));
        }
        let data_completeness = data_completeness(case, directory, &selection.selected);

        Self {
            urgency,
            selected_specialists: selection.selected,
            unavailable_specialists: selection.unavailable,
            data_completeness,
            triage_failed: false,
            warnings,
        }
    }

    /// Static fallback used when the triage specialist cannot be consulted.
    ///
    /// Urgency is `routine` unless the case itself carries a stronger hint.
    pub fn fallback(
        case: &Case,
        directory: &SpecialistDirectory,
        defaults: &[SpecialistId],
        reason: &str,
    ) -> Self {
        let selected: BTreeSet<SpecialistId> = defaults.iter().cloned().collect();
        let mut warnings = vec![format!("Triage unavailable ({}); default routing used", reason)];
        let urgency = match case.urgency_hint() {
            Some(hint) => {
                warnings.push(format!("Urgency taken from case hint ({})", hint));
                hint
            }
            None => {
                warnings.push("Urgency set to routine".to_string());
                Urgency::Routine
            }
        };
        Self {
            urgency,
            data_completeness: data_completeness(case, directory, &selected),
            selected_specialists: selected,
            unavailable_specialists: BTreeSet::new(),
            triage_failed: true,
            warnings,
        }
    }
}

/// Classify urgency from the triage opinion layered over the case's own hint.
///
/// The highest of: the case hint, the triage opinion's tagged urgency, and
/// keyword classification of the triage text. Emergency keywords therefore
/// always win.
pub fn classify_urgency(case: &Case, triage: Option<&SpecialistOpinion>) -> Urgency {
    let mut urgency = case.urgency_hint().unwrap_or_default();
    if let Some(opinion) = triage {
        if let Some(tagged) = opinion.urgency {
            urgency = urgency.max(tagged);
        }
        if let Some(from_text) = Urgency::from_keywords(&opinion.text_corpus()) {
            urgency = urgency.max(from_text);
        }
    }
    urgency
}

/// Specialists picked for a case.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub selected: BTreeSet<SpecialistId>,
    pub unavailable: BTreeSet<SpecialistId>,
    pub used_defaults: bool,
}

/// Keyword matches in the triage text, plus the triage's own referrals.
///
/// The triage specialist itself is never re-selected. When nothing matches,
/// the default set is used so a case is never routed to zero specialists.
pub fn select_specialists(
    triage: &SpecialistOpinion,
    directory: &SpecialistDirectory,
    triage_id: &SpecialistId,
    defaults: &[SpecialistId],
) -> Selection {
    let text = triage.text_corpus();
    let mut selected: BTreeSet<SpecialistId> = directory
        .profiles()
        .filter(|p| &p.id != triage_id && p.matches_text(&text))
        .map(|p| p.id.clone())
        .collect();

    let mut unavailable = BTreeSet::new();
    for referral in &triage.suggested_specialists {
        if referral == triage_id {
            continue;
        }
        if directory.contains(referral) {
            selected.insert(referral.clone());
        } else {
            unavailable.insert(referral.clone());
        }
    }

    let used_defaults = selected.is_empty();
    if used_defaults {
        selected.extend(defaults.iter().cloned());
    }

    Selection {
        selected,
        unavailable,
        used_defaults,
    }
}

/// Fraction of the selected specialists' relevant fields present on the case.
pub fn data_completeness(
    case: &Case,
    directory: &SpecialistDirectory,
    selected: &BTreeSet<SpecialistId>,
) -> f64 {
    case.completeness_over(&directory.relevant_fields(selected.iter()))
}
