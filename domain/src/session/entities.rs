//! Consultation session entities

use crate::conference::ConferenceRecord;
use crate::core::case::{Case, CaseFingerprint};
use crate::core::error::DomainError;
use crate::routing::RoutingDecision;
use crate::specialist::{OpinionStatus, SpecialistId, SpecialistOpinion};
use crate::synthesis::SynthesizedPlan;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier of a consultation session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique id for a session on `case`.
    pub fn generate(case: &Case) -> Self {
        let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}-{}", case.id(), current_timestamp(), n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Triaged,
    Dispatched,
    Conferenced,
    Synthesized,
    Monitoring,
    /// Terminal: no specialist produced a usable opinion
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Triaged => "triaged",
            SessionStatus::Dispatched => "dispatched",
            SessionStatus::Conferenced => "conferenced",
            SessionStatus::Synthesized => "synthesized",
            SessionStatus::Monitoring => "monitoring",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Failed)
    }

    /// Whether a plan is available (synthesized or being monitored).
    pub fn is_complete(&self) -> bool {
        matches!(self, SessionStatus::Synthesized | SessionStatus::Monitoring)
    }

    fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Failed, _) => false,
            (_, Failed) => true,
            (Triaged, Dispatched)
            | (Dispatched, Conferenced)
            | (Conferenced, Synthesized)
            | (Synthesized, Monitoring) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a session's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from: Option<SessionStatus>,
    pub to: SessionStatus,
    /// Milliseconds since epoch
    pub at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One consultation of one case (Entity)
///
/// Owned by the orchestrator; specialists only ever see the [`Case`].
/// Opinions are recorded once per specialist, the history only grows, and the
/// conference and plan are replaced whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSession {
    id: SessionId,
    case: Case,
    fingerprint: CaseFingerprint,
    status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    routing: Option<RoutingDecision>,
    participating_specialists: BTreeSet<SpecialistId>,
    opinions: BTreeMap<SpecialistId, SpecialistOpinion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conference: Option<ConferenceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<SynthesizedPlan>,
    created_at: u64,
    history: Vec<StatusTransition>,
    /// Session this one re-assesses, if it was created at a checkpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    follow_up_of: Option<SessionId>,
}

impl ConsultationSession {
    /// Create a session in `triaged` state from a routing decision.
    pub fn new(case: Case, routing: RoutingDecision) -> Self {
        let now = current_timestamp();
        let mut participating = routing.selected_specialists.clone();
        participating.extend(routing.unavailable_specialists.iter().cloned());
        Self {
            id: SessionId::generate(&case),
            fingerprint: case.fingerprint(),
            case,
            status: SessionStatus::Triaged,
            participating_specialists: participating,
            routing: Some(routing),
            opinions: BTreeMap::new(),
            conference: None,
            plan: None,
            created_at: now,
            history: vec![StatusTransition {
                from: None,
                to: SessionStatus::Triaged,
                at: now,
                note: None,
            }],
            follow_up_of: None,
        }
    }

    /// Link this session to the session it re-assesses.
    pub fn with_follow_up_of(mut self, original: SessionId) -> Self {
        self.follow_up_of = Some(original);
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn fingerprint(&self) -> &CaseFingerprint {
        &self.fingerprint
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn routing(&self) -> Option<&RoutingDecision> {
        self.routing.as_ref()
    }

    pub fn participating_specialists(&self) -> &BTreeSet<SpecialistId> {
        &self.participating_specialists
    }

    pub fn opinions(&self) -> &BTreeMap<SpecialistId, SpecialistOpinion> {
        &self.opinions
    }

    pub fn opinion(&self, id: &SpecialistId) -> Option<&SpecialistOpinion> {
        self.opinions.get(id)
    }

    pub fn conference(&self) -> Option<&ConferenceRecord> {
        self.conference.as_ref()
    }

    pub fn plan(&self) -> Option<&SynthesizedPlan> {
        self.plan.as_ref()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn history(&self) -> &[StatusTransition] {
        &self.history
    }

    pub fn follow_up_of(&self) -> Option<&SessionId> {
        self.follow_up_of.as_ref()
    }

    /// Record a specialist's opinion. Returns `false` (and keeps the first
    /// opinion) if this specialist already has one in this session.
    pub fn record_opinion(&mut self, opinion: SpecialistOpinion) -> bool {
        if self.opinions.contains_key(&opinion.specialist_id) {
            return false;
        }
        self.participating_specialists
            .insert(opinion.specialist_id.clone());
        self.opinions.insert(opinion.specialist_id.clone(), opinion);
        true
    }

    pub fn successful_opinions(&self) -> impl Iterator<Item = &SpecialistOpinion> {
        self.opinions.values().filter(|o| o.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.successful_opinions().count()
    }

    /// Specialists that responded successfully.
    pub fn responded_specialists(&self) -> Vec<SpecialistId> {
        self.successful_opinions()
            .map(|o| o.specialist_id.clone())
            .collect()
    }

    /// Specialists that were expected but did not contribute, with their status.
    pub fn missing_specialists(&self) -> Vec<(SpecialistId, OpinionStatus)> {
        self.opinions
            .values()
            .filter(|o| !o.is_success())
            .map(|o| (o.specialist_id.clone(), o.status))
            .collect()
    }

    /// Move to `next`, appending to the history.
    pub fn transition(
        &mut self,
        next: SessionStatus,
        note: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(StatusTransition {
            from: Some(self.status),
            to: next,
            at: current_timestamp(),
            note,
        });
        self.status = next;
        Ok(())
    }

    /// Attach (or replace) the conference record derived from the current opinions.
    pub fn attach_conference(&mut self, record: ConferenceRecord) {
        self.conference = Some(record);
    }

    pub fn attach_plan(&mut self, plan: SynthesizedPlan) {
        self.plan = Some(plan);
    }
}

/// Get current timestamp in milliseconds
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::urgency::Urgency;

    fn session() -> ConsultationSession {
        let case = Case::new("case-1").with_query("back pain");
        let routing = RoutingDecision {
            urgency: Urgency::Routine,
            selected_specialists: [SpecialistId::new("physio")].into_iter().collect(),
            unavailable_specialists: BTreeSet::new(),
            data_completeness: 0.5,
            triage_failed: false,
            warnings: vec![],
        };
        ConsultationSession::new(case, routing)
    }

    #[test]
    fn test_new_session_is_triaged_with_history() {
        let s = session();
        assert_eq!(s.status(), SessionStatus::Triaged);
        assert_eq!(s.history().len(), 1);
        assert!(s.participating_specialists().contains(&SpecialistId::new("physio")));
        assert_eq!(s.fingerprint(), &s.case().fingerprint());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(session().id(), session().id());
    }

    #[test]
    fn test_lifecycle_transitions_append_history() {
        let mut s = session();
        s.transition(SessionStatus::Dispatched, None).unwrap();
        s.transition(SessionStatus::Conferenced, None).unwrap();
        s.transition(SessionStatus::Synthesized, Some("plan ready".into()))
            .unwrap();
        s.transition(SessionStatus::Monitoring, None).unwrap();

        assert_eq!(s.history().len(), 5);
        assert_eq!(s.history()[3].note.as_deref(), Some("plan ready"));
        assert_eq!(s.history()[4].from, Some(SessionStatus::Synthesized));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut s = session();
        assert!(s.transition(SessionStatus::Synthesized, None).is_err());
        s.transition(SessionStatus::Failed, None).unwrap();
        assert!(s.transition(SessionStatus::Dispatched, None).is_err());
        assert!(s.status().is_terminal());
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_opinion_recorded_once() {
        let mut s = session();
        let first = SpecialistOpinion::success("physio", "musculoskeletal", 0.8);
        let second = SpecialistOpinion::success("physio", "musculoskeletal", 0.2);
        assert!(s.record_opinion(first));
        assert!(!s.record_opinion(second));
        assert_eq!(s.opinion(&SpecialistId::new("physio")).unwrap().confidence, 0.8);
    }

    #[test]
    fn test_responded_and_missing() {
        let mut s = session();
        s.record_opinion(SpecialistOpinion::success("physio", "musculoskeletal", 0.8));
        s.record_opinion(SpecialistOpinion::timeout(SpecialistId::new("sleep"), "sleep", 100));
        assert_eq!(s.success_count(), 1);
        assert_eq!(s.responded_specialists(), vec![SpecialistId::new("physio")]);
        assert_eq!(
            s.missing_specialists(),
            vec![(SpecialistId::new("sleep"), OpinionStatus::Timeout)]
        );
    }

    #[test]
    fn test_session_serde_round_trip_keeps_history() {
        let mut s = session();
        s.transition(SessionStatus::Dispatched, None).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: ConsultationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
