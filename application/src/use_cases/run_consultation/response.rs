//! Transport response
//!
//! Maps use case results to the externally visible status codes:
//! a fast-mode partial session is `processing`, a completed session is
//! `success`, and only the all-failed (or aborted) case is `failed`.

use super::types::{ConsultationError, ConsultationOutcome};
use council_domain::{
    CaseId, ConsultationSession, OpinionStatus, SessionId, SessionStatus, SpecialistId,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Processing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSpecialist {
    pub specialist_id: SpecialistId,
    pub status: OpinionStatus,
}

/// What a transport returns for a consultation request.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationResponse {
    /// True for any usable result, partial or complete
    pub success: bool,
    pub status: ResponseStatus,
    pub case_id: CaseId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<ConsultationSession>,
    /// Specialists that did respond, also on failure
    pub responded_specialists: Vec<SpecialistId>,
    pub missing_specialists: Vec<MissingSpecialist>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConsultationResponse {
    pub fn from_outcome(outcome: &ConsultationOutcome) -> Self {
        let status = if outcome.is_partial() {
            ResponseStatus::Processing
        } else {
            ResponseStatus::Success
        };
        Self::for_session(outcome.session(), true, status, None)
    }

    pub fn from_error(case_id: &CaseId, error: &ConsultationError) -> Self {
        match error.session() {
            Some(session) => {
                Self::for_session(session, false, ResponseStatus::Failed, Some(error.to_string()))
            }
            None => Self {
                success: false,
                status: ResponseStatus::Failed,
                case_id: case_id.clone(),
                session_id: None,
                session: None,
                responded_specialists: Vec::new(),
                missing_specialists: Vec::new(),
                error: Some(error.to_string()),
            },
        }
    }

    pub fn from_result(
        case_id: &CaseId,
        result: &Result<ConsultationOutcome, ConsultationError>,
    ) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(e) => Self::from_error(case_id, e),
        }
    }

    /// Response for a session fetched after the fact (e.g. a fast-mode poll).
    pub fn from_session(session: &ConsultationSession) -> Self {
        let (success, status) = match session.status() {
            SessionStatus::Failed => (false, ResponseStatus::Failed),
            s if s.is_complete() => (true, ResponseStatus::Success),
            _ => (true, ResponseStatus::Processing),
        };
        Self::for_session(session, success, status, None)
    }

    fn for_session(
        session: &ConsultationSession,
        success: bool,
        status: ResponseStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            success,
            status,
            case_id: session.case().id().clone(),
            session_id: Some(session.id().clone()),
            session: Some(session.clone()),
            responded_specialists: session.responded_specialists(),
            missing_specialists: session
                .missing_specialists()
                .into_iter()
                .map(|(specialist_id, status)| MissingSpecialist {
                    specialist_id,
                    status,
                })
                .collect(),
            error,
        }
    }

    /// Process exit code for CLI transports: non-zero only on hard failure.
    pub fn exit_code(&self) -> i32 {
        if self.success { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{Case, RoutingDecision, SpecialistOpinion, Urgency};
    use std::collections::BTreeSet;

    fn session() -> ConsultationSession {
        let routing = RoutingDecision {
            urgency: Urgency::Routine,
            selected_specialists: BTreeSet::from([SpecialistId::new("physio")]),
            unavailable_specialists: BTreeSet::new(),
            data_completeness: 1.0,
            triage_failed: false,
            warnings: Vec::new(),
        };
        let mut session =
            ConsultationSession::new(Case::new("c1").with_query("back pain"), routing);
        session.record_opinion(SpecialistOpinion::success("triage", "general", 0.6));
        session.record_opinion(SpecialistOpinion::timeout(
            SpecialistId::new("physio"),
            "musculoskeletal",
            100,
        ));
        session
    }

    #[test]
    fn test_in_flight_session_is_processing() {
        let mut s = session();
        s.transition(SessionStatus::Dispatched, None).unwrap();
        let response = ConsultationResponse::from_session(&s);
        assert!(response.success);
        assert_eq!(response.status, ResponseStatus::Processing);
        assert_eq!(response.responded_specialists, vec![SpecialistId::new("triage")]);
        assert_eq!(response.missing_specialists.len(), 1);
        assert_eq!(response.exit_code(), 0);
    }

    #[test]
    fn test_failed_session_lists_who_responded() {
        let mut s = session();
        s.transition(SessionStatus::Failed, None).unwrap();
        let error = ConsultationError::ConsultationFailed {
            attempted: s.opinions().keys().cloned().collect(),
            session: Box::new(s),
        };
        let response = ConsultationResponse::from_error(&CaseId::new("c1"), &error);
        assert!(!response.success);
        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.exit_code(), 1);
        assert!(response.error.unwrap().contains("2 attempted"));
    }

    #[test]
    fn test_error_without_session() {
        let error = ConsultationError::Cancelled { session: None };
        let response = ConsultationResponse::from_error(&CaseId::new("c9"), &error);
        assert_eq!(response.case_id, CaseId::new("c9"));
        assert!(response.session_id.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["success"], false);
    }
}
