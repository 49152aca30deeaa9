use super::{ClinicalFlags, PHASE_COUNT, RedFlag, SynthesizedPlan, TreatmentPhase};
use crate::conference::ConferenceRecord;
use crate::confidence::{ConfidenceFactors, ConfidenceModel};
use crate::core::string::{normalize_phrase, shares_terms};
use crate::core::urgency::Urgency;
use crate::session::ConsultationSession;
use crate::specialist::{OpinionStatus, Severity, SpecialistId};
use std::collections::{BTreeMap, HashMap};

/// Agreement penalty per disagreement, by severity.
fn disagreement_weight(severity: Severity) -> f64 {
    match severity {
        Severity::Low => 0.1,
        Severity::Moderate => 0.25,
        Severity::High => 0.5,
    }
}

struct Candidate {
    text: String,
    confidence: f64,
}

/// Reduce a session and its conference record into a plan.
///
/// Never fails: a partial opinion set lowers the confidence breakdown and is
/// recorded in `non_contributing`.
pub fn synthesize(session: &ConsultationSession, conference: &ConferenceRecord) -> SynthesizedPlan {
    let urgency = session
        .routing()
        .map(|r| r.urgency)
        .or(session.case().urgency_hint())
        .unwrap_or_default();

    let red_flags = collect_red_flags(session);
    let requires_immediate_escalation =
        red_flags.iter().any(|f| f.severity == Severity::High) || urgency == Urgency::Emergency;

    let priority_topics: Vec<&str> = red_flags
        .iter()
        .filter(|f| f.severity == Severity::High)
        .map(|f| f.flag.as_str())
        .chain(
            conference
                .disagreements_at_least(Severity::High)
                .map(|d| d.topic.as_str()),
        )
        .collect();

    let (immediate, mut ranked): (Vec<Candidate>, Vec<Candidate>) = collect_recommendations(session)
        .into_iter()
        .partition(|c| priority_topics.iter().any(|t| shares_terms(&c.text, t)));
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let split = ranked.len().div_ceil(2);
    let consolidation = ranked.split_off(split);

    let phases = vec![
        TreatmentPhase {
            number: 1,
            name: "Immediate Stabilization".to_string(),
            timeframe: immediate_timeframe(urgency).to_string(),
            goals: immediate_goals(&red_flags, conference),
            interventions: or_default(immediate, "Review consultation findings with the care team"),
        },
        TreatmentPhase {
            number: 2,
            name: "Active Intervention".to_string(),
            timeframe: "Weeks 2-6".to_string(),
            goals: active_goals(conference),
            interventions: or_default(ranked, "Progress the agreed treatment program"),
        },
        TreatmentPhase {
            number: 3,
            name: "Consolidation & Maintenance".to_string(),
            timeframe: "Weeks 6-12".to_string(),
            goals: vec![
                "Maintain gains and prevent recurrence".to_string(),
                "Transition to self-management".to_string(),
            ],
            interventions: or_default(consolidation, "Schedule a maintenance review"),
        },
    ];
    debug_assert_eq!(phases.len(), PHASE_COUNT);

    let data_completeness = session
        .routing()
        .map(|r| r.data_completeness)
        .unwrap_or_else(|| session.case().completeness());
    let confidence_factors = ConfidenceFactors::new(
        data_completeness,
        inter_agent_agreement(conference),
        evidence_quality(session),
    );

    let non_contributing = non_contributing(session);
    let mut annotations = Vec::new();
    if !non_contributing.is_empty() {
        let missing: Vec<String> = non_contributing
            .iter()
            .map(|(id, status)| format!("{} ({})", id, status))
            .collect();
        annotations.push(format!(
            "{} of {} specialists contributed; missing: {}",
            session.success_count(),
            session.participating_specialists().len(),
            missing.join(", ")
        ));
    }
    if session.routing().is_some_and(|r| r.triage_failed) {
        annotations.push("Triage was unavailable; default routing was used".to_string());
    }

    SynthesizedPlan {
        phases,
        clinical_flags: ClinicalFlags {
            red_flags,
            requires_immediate_escalation,
            urgency_level: urgency,
        },
        confidence_factors,
        tracking_metrics: tracking_metrics(session, urgency),
        next_checkpoint_days: urgency.checkpoint_interval_days(),
        non_contributing,
        annotations,
    }
}

/// Union of escalating key findings, deduplicated keeping the highest severity.
fn collect_red_flags(session: &ConsultationSession) -> Vec<RedFlag> {
    let mut flags: Vec<RedFlag> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for opinion in session.opinions().values() {
        for kf in opinion.key_findings.iter().filter(|k| k.requires_escalation) {
            let key = normalize_phrase(&kf.finding);
            match index.get(&key) {
                Some(&i) => {
                    if kf.clinical_relevance > flags[i].severity {
                        flags[i].severity = kf.clinical_relevance;
                        flags[i].source_specialist = opinion.specialist_id.clone();
                    }
                }
                None => {
                    index.insert(key, flags.len());
                    flags.push(RedFlag {
                        flag: kf.finding.clone(),
                        severity: kf.clinical_relevance,
                        source_specialist: opinion.specialist_id.clone(),
                    });
                }
            }
        }
    }

    flags.sort_by(|a, b| b.severity.cmp(&a.severity));
    flags
}

/// Recommendations from successful opinions, deduplicated.
///
/// A duplicate keeps the highest originating confidence.
fn collect_recommendations(session: &ConsultationSession) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for opinion in session.successful_opinions() {
        for rec in &opinion.recommendations {
            let key = normalize_phrase(rec);
            if key.is_empty() {
                continue;
            }
            match index.get(&key) {
                Some(&i) => out[i].confidence = out[i].confidence.max(opinion.confidence),
                None => {
                    index.insert(key, out.len());
                    out.push(Candidate {
                        text: rec.trim().to_string(),
                        confidence: opinion.confidence,
                    });
                }
            }
        }
    }
    out
}

fn or_default(candidates: Vec<Candidate>, fallback: &str) -> Vec<String> {
    if candidates.is_empty() {
        vec![fallback.to_string()]
    } else {
        candidates.into_iter().map(|c| c.text).collect()
    }
}

fn immediate_timeframe(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Emergency => "Within 24 hours",
        Urgency::Urgent => "Days 1-3",
        Urgency::SemiUrgent => "Week 1",
        Urgency::Routine => "Weeks 1-2",
    }
}

fn immediate_goals(red_flags: &[RedFlag], conference: &ConferenceRecord) -> Vec<String> {
    let mut goals: Vec<String> = red_flags
        .iter()
        .filter(|f| f.severity == Severity::High)
        .map(|f| format!("Rule out or escalate: {}", f.flag))
        .collect();
    goals.extend(
        conference
            .disagreements_at_least(Severity::High)
            .map(|d| format!("Resolve disagreement on {}", d.topic)),
    );
    if goals.is_empty() {
        goals.push("Stabilize symptoms and confirm the working assessment".to_string());
    }
    goals
}

fn active_goals(conference: &ConferenceRecord) -> Vec<String> {
    let mut goals: Vec<String> = conference
        .emergent_findings
        .iter()
        .map(|e| format!("Address cross-domain finding: {}", e.finding))
        .collect();
    goals.push("Restore function and tolerance to daily activity".to_string());
    goals
}

/// 1 minus the severity-weighted disagreement load, floored at 0.
fn inter_agent_agreement(conference: &ConferenceRecord) -> f64 {
    let load: f64 = conference
        .disagreements
        .iter()
        .map(|d| disagreement_weight(d.severity))
        .sum();
    (1.0 - load).clamp(0.0, 1.0)
}

/// Mean successful confidence, scaled by the share of dispatched specialists
/// that did not fail or time out.
fn evidence_quality(session: &ConsultationSession) -> f64 {
    let successes: Vec<f64> = session.successful_opinions().map(|o| o.confidence).collect();
    let faulted = session
        .opinions()
        .values()
        .filter(|o| matches!(o.status, OpinionStatus::Failed | OpinionStatus::Timeout))
        .count();
    let attempted = successes.len() + faulted;
    if attempted == 0 {
        return 0.0;
    }
    ConfidenceModel::aggregate(successes.iter().copied()) * successes.len() as f64
        / attempted as f64
}

fn tracking_metrics(session: &ConsultationSession, urgency: Urgency) -> Vec<String> {
    let mut metrics: Vec<String> = session.case().baseline_metrics().keys().cloned().collect();
    metrics.push("adherence".to_string());
    if urgency.is_time_critical() {
        metrics.push("red_flag_symptoms".to_string());
    }
    metrics
}

fn non_contributing(session: &ConsultationSession) -> BTreeMap<SpecialistId, OpinionStatus> {
    session
        .participating_specialists()
        .iter()
        .filter_map(|id| match session.opinion(id) {
            Some(o) if o.is_success() => None,
            Some(o) => Some((id.clone(), o.status)),
            None => Some((id.clone(), OpinionStatus::Unavailable)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::case::Case;
    use crate::routing::RoutingDecision;
    use crate::specialist::{KeyFinding, SpecialistDirectory, SpecialistOpinion, SpecialistProfile};
    use std::collections::BTreeSet;

    fn routing(urgency: Urgency, ids: &[&str]) -> RoutingDecision {
        RoutingDecision {
            urgency,
            selected_specialists: ids.iter().map(|s| SpecialistId::new(*s)).collect(),
            unavailable_specialists: BTreeSet::new(),
            data_completeness: 0.5,
            triage_failed: false,
            warnings: Vec::new(),
        }
    }

    fn session_with(urgency: Urgency, opinions: Vec<SpecialistOpinion>) -> ConsultationSession {
        let ids: Vec<String> = opinions.iter().map(|o| o.specialist_id.to_string()).collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let case = Case::new("case-1")
            .with_query("lower back pain")
            .with_baseline("pain_level", 8.0);
        let mut session = ConsultationSession::new(case, routing(urgency, &ids));
        for o in opinions {
            session.record_opinion(o);
        }
        session
    }

    fn run(session: &ConsultationSession) -> SynthesizedPlan {
        let directory = SpecialistDirectory::new(vec![
            SpecialistProfile::new("physio", "musculoskeletal"),
            SpecialistProfile::new("pain", "pain"),
        ]);
        let record = ConferenceRecord::conduct(session.opinions().values(), &directory);
        synthesize(session, &record)
    }

    #[test]
    fn test_plan_has_three_phases_and_bounded_confidence() {
        let session = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.9)
                    .with_recommendation("Graded walking program")
                    .with_recommendation("Core stability exercises")
                    .with_recommendation("Hip mobility drills"),
                SpecialistOpinion::timeout(SpecialistId::new("pain"), "pain", 5000),
            ],
        );
        let plan = run(&session);

        assert_eq!(plan.phases.len(), 3);
        assert_eq!(plan.phases[0].name, "Immediate Stabilization");
        assert!((0.0..=1.0).contains(&plan.confidence_factors.overall));
        assert_eq!(plan.phase(2).map(|p| p.interventions.len()), Some(2));
        assert_eq!(plan.phase(3).map(|p| p.interventions.len()), Some(1));
        assert!(!plan.phase(1).map(|p| p.interventions.is_empty()).unwrap_or(true));
        assert_eq!(
            plan.non_contributing.get(&SpecialistId::new("pain")),
            Some(&OpinionStatus::Timeout)
        );
        assert_eq!(plan.annotations.len(), 1);
    }

    #[test]
    fn test_high_red_flag_forces_escalation_and_phase_one() {
        let session = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.6)
                    .with_key_finding(
                        KeyFinding::new("Saddle anaesthesia", Severity::High).escalate(),
                    )
                    .with_recommendation("Same-day imaging for saddle anaesthesia")
                    .with_recommendation("Gentle walking"),
                SpecialistOpinion::success("pain", "pain", 0.8)
                    .with_key_finding(KeyFinding::new("saddle anaesthesia", Severity::Moderate).escalate()),
            ],
        );
        let plan = run(&session);

        assert!(plan.clinical_flags.requires_immediate_escalation);
        assert_eq!(plan.clinical_flags.red_flags.len(), 1);
        assert_eq!(plan.clinical_flags.red_flags[0].severity, Severity::High);
        assert_eq!(
            plan.clinical_flags.red_flags[0].source_specialist,
            SpecialistId::new("physio")
        );
        assert_eq!(
            plan.phases[0].interventions,
            vec!["Same-day imaging for saddle anaesthesia".to_string()]
        );
        assert_eq!(plan.phases[1].interventions, vec!["Gentle walking".to_string()]);
    }

    #[test]
    fn test_emergency_urgency_escalates_without_flags() {
        let session = session_with(
            Urgency::Emergency,
            vec![SpecialistOpinion::success("physio", "musculoskeletal", 0.7)],
        );
        let plan = run(&session);
        assert!(plan.clinical_flags.red_flags.is_empty());
        assert!(plan.clinical_flags.requires_immediate_escalation);
        assert_eq!(plan.next_checkpoint_days, 3);
        assert!(plan.tracking_metrics.contains(&"red_flag_symptoms".to_string()));
    }

    #[test]
    fn test_moderate_red_flag_alone_does_not_escalate() {
        let session = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.7)
                    .with_key_finding(KeyFinding::new("Night pain", Severity::Moderate).escalate()),
            ],
        );
        let plan = run(&session);
        assert_eq!(plan.clinical_flags.red_flags.len(), 1);
        assert!(!plan.clinical_flags.requires_immediate_escalation);
        assert_eq!(plan.next_checkpoint_days, 14);
        assert_eq!(
            plan.tracking_metrics,
            vec!["pain_level".to_string(), "adherence".to_string()]
        );
    }

    #[test]
    fn test_recommendations_deduplicated_keeping_highest_confidence() {
        let session = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.4)
                    .with_recommendation("Heat therapy")
                    .with_recommendation("Sleep hygiene education"),
                SpecialistOpinion::success("pain", "pain", 0.9)
                    .with_recommendation("heat therapy.")
                    .with_recommendation("Pacing"),
            ],
        );
        let plan = run(&session);
        let all: Vec<&str> = plan.interventions().collect();
        assert_eq!(all.iter().filter(|i| i.to_lowercase().starts_with("heat")).count(), 1);
        // First wording wins; its confidence is the best of both
        assert_eq!(plan.phases[1].interventions, vec!["heat therapy.", "Pacing"]);
        assert_eq!(plan.phases[2].interventions, vec!["Sleep hygiene education"]);
    }

    #[test]
    fn test_evidence_discounted_by_faults() {
        let healthy = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.8),
                SpecialistOpinion::success("pain", "pain", 0.8),
            ],
        );
        let degraded = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.8),
                SpecialistOpinion::failed(SpecialistId::new("pain"), "pain", "boom"),
            ],
        );
        let a = run(&healthy).confidence_factors;
        let b = run(&degraded).confidence_factors;
        assert!((a.evidence_quality - 0.8).abs() < 1e-9);
        assert!((b.evidence_quality - 0.4).abs() < 1e-9);
        assert!(b.overall < a.overall);
    }

    #[test]
    fn test_disagreement_lowers_agreement() {
        let session = session_with(
            Urgency::Routine,
            vec![
                SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                    .with_risk("chronicity", Severity::High),
                SpecialistOpinion::success("pain", "pain", 0.8)
                    .with_risk("chronicity", Severity::Low),
            ],
        );
        let plan = run(&session);
        assert!((plan.confidence_factors.inter_agent_agreement - 0.75).abs() < 1e-9);
    }
}
