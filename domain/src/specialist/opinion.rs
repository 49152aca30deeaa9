//! Structured specialist opinion
//!
//! The opinion contract is structured at the boundary: urgency, risk levels
//! and escalation needs are tagged fields, so the orchestrator never has to
//! recover them from `raw_text`.

use super::profile::SpecialistId;
use crate::core::urgency::Urgency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical severity/relevance of a finding, red flag or disagreement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "moderate" | "medium" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            _ => Err(format!("Invalid severity: {}. Valid: low, moderate, high", s)),
        }
    }
}

/// Risk level a specialist assigns to one case dimension.
pub type RiskLevel = Severity;

/// Priority of a question addressed to another specialist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// Terminal status of one specialist call within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpinionStatus {
    Success,
    Failed,
    Timeout,
    /// Requested but not registered in the capability table
    Unavailable,
}

impl OpinionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpinionStatus::Success => "success",
            OpinionStatus::Failed => "failed",
            OpinionStatus::Timeout => "timeout",
            OpinionStatus::Unavailable => "unavailable",
        }
    }

    /// Whether the specialist was actually called and did not deliver.
    pub fn is_fault(&self) -> bool {
        matches!(self, OpinionStatus::Failed | OpinionStatus::Timeout)
    }
}

impl fmt::Display for OpinionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding with its own confidence and escalation need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFinding {
    pub finding: String,
    pub confidence: f64,
    pub clinical_relevance: Severity,
    #[serde(default)]
    pub requires_escalation: bool,
}

impl KeyFinding {
    pub fn new(finding: impl Into<String>, clinical_relevance: Severity) -> Self {
        Self {
            finding: finding.into(),
            confidence: 0.5,
            clinical_relevance,
            requires_escalation: false,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn escalate(mut self) -> Self {
        self.requires_escalation = true;
        self
    }
}

/// Question one specialist wants another to answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionForOther {
    pub target_specialist_id: SpecialistId,
    pub question: String,
    #[serde(default)]
    pub priority: Priority,
}

impl QuestionForOther {
    pub fn new(target: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            target_specialist_id: SpecialistId::new(target),
            question: question.into(),
            priority: Priority::Normal,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// Risk level for one named case dimension (e.g. "neurological", "prognosis").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub dimension: String,
    pub level: RiskLevel,
}

impl RiskAssessment {
    pub fn new(dimension: impl Into<String>, level: RiskLevel) -> Self {
        Self {
            dimension: dimension.into(),
            level,
        }
    }
}

/// One specialist's opinion on a case.
///
/// Produced exactly once per specialist per session and never mutated after
/// it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistOpinion {
    pub specialist_id: SpecialistId,
    pub domain: String,
    pub confidence: f64,
    #[serde(default)]
    pub primary_findings: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<KeyFinding>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub questions_for_others: Vec<QuestionForOther>,
    #[serde(default)]
    pub follow_up_questions_for_case: Vec<String>,
    /// Urgency this specialist assigns to the case, if it has a view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub risk_assessments: Vec<RiskAssessment>,
    /// Other specialists this one recommends consulting
    #[serde(default)]
    pub suggested_specialists: Vec<SpecialistId>,
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub latency_ms: u64,
    pub status: OpinionStatus,
    /// Why the call did not succeed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl SpecialistOpinion {
    /// Creates an empty successful opinion to be filled in by builder methods.
    pub fn success(
        specialist_id: impl Into<String>,
        domain: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            specialist_id: SpecialistId::new(specialist_id),
            domain: domain.into(),
            confidence: confidence.clamp(0.0, 1.0),
            primary_findings: Vec::new(),
            key_findings: Vec::new(),
            recommendations: Vec::new(),
            questions_for_others: Vec::new(),
            follow_up_questions_for_case: Vec::new(),
            urgency: None,
            risk_assessments: Vec::new(),
            suggested_specialists: Vec::new(),
            raw_text: String::new(),
            latency_ms: 0,
            status: OpinionStatus::Success,
            error: None,
        }
    }

    /// Record of a call that did not produce an opinion: empty findings, zero confidence.
    pub fn unsuccessful(
        specialist_id: SpecialistId,
        domain: impl Into<String>,
        status: OpinionStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            confidence: 0.0,
            status,
            error: Some(error.into()),
            specialist_id,
            ..Self::success("", domain, 0.0)
        }
    }

    pub fn failed(specialist_id: SpecialistId, domain: impl Into<String>, error: impl Into<String>) -> Self {
        Self::unsuccessful(specialist_id, domain, OpinionStatus::Failed, error)
    }

    pub fn timeout(specialist_id: SpecialistId, domain: impl Into<String>, after_ms: u64) -> Self {
        let mut opinion = Self::unsuccessful(
            specialist_id,
            domain,
            OpinionStatus::Timeout,
            format!("no response within {}ms", after_ms),
        );
        opinion.latency_ms = after_ms;
        opinion
    }

    pub fn unavailable(specialist_id: SpecialistId) -> Self {
        let error = format!("specialist '{}' is not registered", specialist_id);
        Self::unsuccessful(specialist_id, "unknown", OpinionStatus::Unavailable, error)
    }

    pub fn with_primary_finding(mut self, finding: impl Into<String>) -> Self {
        self.primary_findings.push(finding.into());
        self
    }

    pub fn with_key_finding(mut self, finding: KeyFinding) -> Self {
        self.key_findings.push(finding);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendations.push(recommendation.into());
        self
    }

    pub fn with_question(mut self, question: QuestionForOther) -> Self {
        self.questions_for_others.push(question);
        self
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    pub fn with_risk(mut self, dimension: impl Into<String>, level: RiskLevel) -> Self {
        self.risk_assessments.push(RiskAssessment::new(dimension, level));
        self
    }

    pub fn with_referral(mut self, specialist: impl Into<String>) -> Self {
        self.suggested_specialists.push(SpecialistId::new(specialist));
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = text.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == OpinionStatus::Success
    }

    /// Bring the opinion and key-finding confidences into 0..1; NaN becomes 0.
    pub fn clamp_confidences(&mut self) {
        self.confidence = unit_interval(self.confidence);
        for finding in &mut self.key_findings {
            finding.confidence = unit_interval(finding.confidence);
        }
    }

    /// Whether any key finding of this opinion asks for escalation.
    pub fn flags_escalation(&self) -> bool {
        self.key_findings.iter().any(|f| f.requires_escalation)
    }

    /// All text carried by this opinion, for keyword routing.
    pub fn text_corpus(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.primary_findings.iter().map(String::as_str));
        parts.extend(self.key_findings.iter().map(|f| f.finding.as_str()));
        parts.extend(self.recommendations.iter().map(String::as_str));
        if !self.raw_text.is_empty() {
            parts.push(&self.raw_text);
        }
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_builder() {
        let opinion = SpecialistOpinion::success("physio", "musculoskeletal", 1.4)
            .with_primary_finding("Mechanical low back pain")
            .with_key_finding(KeyFinding::new("Radiating leg pain", Severity::High).escalate())
            .with_recommendation("Graded activity program")
            .with_risk("neurological", Severity::High)
            .with_urgency(Urgency::Urgent);

        assert!(opinion.is_success());
        assert_eq!(opinion.confidence, 1.0);
        assert!(opinion.flags_escalation());
        assert!(opinion.text_corpus().contains("Graded activity"));
    }

    #[test]
    fn test_clamp_confidences() {
        let mut opinion: SpecialistOpinion = serde_json::from_str(
            r#"{
                "specialist_id": "pain",
                "domain": "pain",
                "confidence": 3.5,
                "status": "success",
                "key_findings": [
                    {"finding": "Central sensitisation", "confidence": -0.4, "clinical_relevance": "moderate"},
                    {"finding": "Fear avoidance", "confidence": 0.6, "clinical_relevance": "low"}
                ]
            }"#,
        )
        .unwrap();
        opinion.clamp_confidences();
        assert_eq!(opinion.confidence, 1.0);
        assert_eq!(opinion.key_findings[0].confidence, 0.0);
        assert_eq!(opinion.key_findings[1].confidence, 0.6);

        opinion.confidence = f64::NAN;
        opinion.clamp_confidences();
        assert_eq!(opinion.confidence, 0.0);
    }

    #[test]
    fn test_unsuccessful_opinions_have_empty_findings() {
        let timeout = SpecialistOpinion::timeout(SpecialistId::new("sleep"), "sleep", 5000);
        assert_eq!(timeout.status, OpinionStatus::Timeout);
        assert!(timeout.primary_findings.is_empty());
        assert_eq!(timeout.confidence, 0.0);
        assert_eq!(timeout.latency_ms, 5000);
        assert_eq!(timeout.specialist_id.as_str(), "sleep");

        let missing = SpecialistOpinion::unavailable(SpecialistId::new("cardio"));
        assert_eq!(missing.status, OpinionStatus::Unavailable);
        assert!(!missing.status.is_fault());
        assert!(OpinionStatus::Failed.is_fault());
    }

    #[test]
    fn test_deserialize_minimal_opinion() {
        let json = r#"{
            "specialist_id": "sleep",
            "domain": "sleep",
            "confidence": 0.8,
            "key_findings": [
                {"finding": "Sleep fragmentation", "confidence": 0.7, "clinical_relevance": "moderate"}
            ],
            "status": "success"
        }"#;
        let opinion: SpecialistOpinion = serde_json::from_str(json).unwrap();
        assert_eq!(opinion.key_findings.len(), 1);
        assert!(!opinion.key_findings[0].requires_escalation);
        assert!(opinion.urgency.is_none());
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("Medium".parse::<Severity>().ok(), Some(Severity::Moderate));
        assert!(Severity::High > Severity::Low);
    }
}
