//! Emergent findings: the same key finding reached independently across domains.

use crate::core::string::normalize_phrase;
use crate::specialist::{SpecialistDirectory, SpecialistId, SpecialistOpinion};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How valuable a corroboration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Novelty {
    /// Corroborated only by related domains
    Moderate,
    /// Corroborated by at least two unrelated domains
    High,
}

/// A finding corroborated by two or more specialists from different domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergentFinding {
    pub finding: String,
    /// Always at least two specialists
    pub discovered_by: BTreeSet<SpecialistId>,
    pub domains: BTreeSet<String>,
    pub novelty: Novelty,
    /// Mean confidence of the corroborating key findings
    pub confidence: f64,
}

struct Sighting<'a> {
    specialist: &'a SpecialistId,
    domain: String,
    text: &'a str,
    confidence: f64,
}

pub(super) fn detect_emergent_findings(
    opinions: &BTreeMap<&SpecialistId, &SpecialistOpinion>,
    directory: &SpecialistDirectory,
) -> Vec<EmergentFinding> {
    let mut sightings: BTreeMap<String, Vec<Sighting<'_>>> = BTreeMap::new();

    for opinion in opinions.values() {
        let domain = directory
            .domain_of(&opinion.specialist_id)
            .unwrap_or(&opinion.domain)
            .to_lowercase();
        let mut seen = BTreeSet::new();
        for kf in &opinion.key_findings {
            let key = normalize_phrase(&kf.finding);
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            sightings.entry(key).or_default().push(Sighting {
                specialist: &opinion.specialist_id,
                domain: domain.clone(),
                text: &kf.finding,
                confidence: kf.confidence,
            });
        }
    }

    sightings
        .into_values()
        .filter_map(|group| promote(&group, directory))
        .collect()
}

fn promote(group: &[Sighting<'_>], directory: &SpecialistDirectory) -> Option<EmergentFinding> {
    let domains: BTreeSet<String> = group.iter().map(|s| s.domain.clone()).collect();
    // Same-domain repetition is not corroboration
    if group.len() < 2 || domains.len() < 2 {
        return None;
    }

    let domain_list: Vec<&String> = domains.iter().collect();
    let unrelated_pair = domain_list.iter().enumerate().any(|(i, a)| {
        domain_list[i + 1..]
            .iter()
            .any(|b| !directory.domains_related(a, b))
    });
    let novelty = if unrelated_pair {
        Novelty::High
    } else {
        Novelty::Moderate
    };

    let confidence = group.iter().map(|s| s.confidence).sum::<f64>() / group.len() as f64;

    Some(EmergentFinding {
        finding: group[0].text.trim().trim_end_matches('.').to_string(),
        discovered_by: group.iter().map(|s| s.specialist.clone()).collect(),
        domains,
        novelty,
        confidence,
    })
}
