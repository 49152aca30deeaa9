//! Specialist table from TOML (`[[specialists]]` entries)
//!
//! Each entry declares one registered specialist. `kind = "rules"` builds a
//! deterministic rule-profile specialist; `kind = "http"` forwards the case to
//! a remote endpoint (requires the `http-specialists` feature).
//!
//! ```toml
//! [[specialists]]
//! id = "physio"
//! domain = "musculoskeletal"
//! keywords = ["back", "knee", "mobility"]
//! relevant_fields = ["pain_location", "activity_level"]
//! related_domains = ["pain"]
//!
//! [[specialists.rules]]
//! pattern = "radiat\\w* (down|into) (the )?(leg|arm)"
//! finding = "Radicular pain pattern"
//! severity = "high"
//! escalate = true
//! recommendation = "Neurological screening before loading"
//! ```

use council_domain::{
    ConfigIssue, ConfigIssueCode, Priority, Severity, SpecialistId, SpecialistProfile, Urgency,
};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a configured specialist is realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistKind {
    #[default]
    Rules,
    Http,
}

/// Risk assessment contributed by a matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRiskConfig {
    pub dimension: String,
    pub level: Severity,
}

/// Question for another specialist contributed by a matching rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileQuestionConfig {
    pub target: String,
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
}

/// One rule of a rule-profile specialist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRuleConfig {
    /// Case-insensitive regex over the case's query and field values
    pub pattern: String,
    pub finding: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub escalate: bool,
    /// Finding confidence; the specialist's own confidence when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<FileRiskConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<FileQuestionConfig>,
    /// Specialist to refer the case to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer: Option<String>,
}

impl FileRuleConfig {
    pub fn new(pattern: impl Into<String>, finding: impl Into<String>, severity: Severity) -> Self {
        Self {
            pattern: pattern.into(),
            finding: finding.into(),
            severity,
            escalate: false,
            confidence: None,
            recommendation: None,
            risk: None,
            urgency: None,
            question: None,
            refer: None,
        }
    }

    fn escalate(mut self) -> Self {
        self.escalate = true;
        self
    }

    fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    fn risk(mut self, dimension: impl Into<String>, level: Severity) -> Self {
        self.risk = Some(FileRiskConfig {
            dimension: dimension.into(),
            level,
        });
        self
    }

    fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = Some(urgency);
        self
    }

    fn ask(mut self, target: &str, text: impl Into<String>) -> Self {
        self.question = Some(FileQuestionConfig {
            target: target.to_string(),
            text: text.into(),
            priority: Priority::Normal,
        });
        self
    }

    fn refer(mut self, target: &str) -> Self {
        self.refer = Some(target.to_string());
        self
    }
}

/// One `[[specialists]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSpecialistConfig {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub relevant_fields: Vec<String>,
    #[serde(default)]
    pub related_domains: Vec<String>,
    #[serde(default)]
    pub kind: SpecialistKind,
    #[serde(default)]
    pub rules: Vec<FileRuleConfig>,
    /// Endpoint URL for `kind = "http"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl FileSpecialistConfig {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            keywords: Vec::new(),
            relevant_fields: Vec::new(),
            related_domains: Vec::new(),
            kind: SpecialistKind::Rules,
            rules: Vec::new(),
            endpoint: None,
        }
    }

    pub fn profile(&self) -> SpecialistProfile {
        SpecialistProfile::new(self.id.trim(), self.domain.trim())
            .with_keywords(self.keywords.iter().cloned())
            .with_relevant_fields(self.relevant_fields.iter().cloned())
            .with_related_domains(self.related_domains.iter().cloned())
    }

    fn keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|s| s.to_string()).collect();
        self
    }

    fn fields(mut self, fields: &[&str]) -> Self {
        self.relevant_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    fn related(mut self, domains: &[&str]) -> Self {
        self.related_domains = domains.iter().map(|s| s.to_string()).collect();
        self
    }

    fn rule(mut self, rule: FileRuleConfig) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Built-in specialist roster used when no `[[specialists]]` are configured.
pub fn default_specialists() -> Vec<FileSpecialistConfig> {
    vec![
        FileSpecialistConfig::new("triage", "triage")
            .fields(&["chief_complaint", "duration", "age"])
            .rule(
                FileRuleConfig::new(
                    r"(loss of (bladder|bowel)|saddle (numbness|anaesthesia|anesthesia)|chest pain)",
                    "Red-flag symptoms reported",
                    Severity::High,
                )
                .escalate()
                .urgency(Urgency::Emergency),
            )
            .rule(
                FileRuleConfig::new(r"\b(back|neck|knee|shoulder|hip|joint)\b", "Musculoskeletal complaint", Severity::Moderate)
                    .refer("physio"),
            )
            .rule(
                FileRuleConfig::new(r"\b(pain|ache|aching|sore)\b", "Pain is a presenting problem", Severity::Moderate)
                    .refer("pain"),
            )
            .rule(
                FileRuleConfig::new(r"\b(sleep|insomnia|waking|tired|fatigue)\b", "Sleep disturbance reported", Severity::Low)
                    .refer("sleep"),
            )
            .rule(
                FileRuleConfig::new(r"\b(anxi\w*|depress\w*|stress|low mood|worry)\b", "Psychological distress reported", Severity::Moderate)
                    .refer("psychology"),
            ),
        FileSpecialistConfig::new("physio", "musculoskeletal")
            .keywords(&["back", "neck", "knee", "shoulder", "hip", "joint", "mobility", "posture"])
            .fields(&["pain_location", "activity_level", "occupation", "range_of_motion"])
            .related(&["pain"])
            .rule(
                FileRuleConfig::new(
                    r"radiat\w* (down|into) (the )?(leg|arm)",
                    "Radicular pain pattern",
                    Severity::High,
                )
                .escalate()
                .recommend("Neurological screening before progressive loading")
                .risk("neurological", Severity::High)
                .urgency(Urgency::Urgent)
                .ask("pain", "Is neuropathic pain medication indicated?"),
            )
            .rule(
                FileRuleConfig::new(r"\b(sitting|desk|posture)\b", "Sustained sedentary loading", Severity::Moderate)
                    .recommend("Graded activity program with movement breaks"),
            )
            .rule(
                FileRuleConfig::new(r"\b(back|neck|knee|shoulder|hip)\b", "Mechanical musculoskeletal pain", Severity::Moderate)
                    .recommend("Progressive strengthening exercises")
                    .risk("functional", Severity::Moderate),
            ),
        FileSpecialistConfig::new("pain", "pain")
            .keywords(&["pain", "ache", "burning", "chronic", "medication", "flare"])
            .fields(&["pain_score", "medications", "duration"])
            .related(&["musculoskeletal", "psychology"])
            .rule(
                FileRuleConfig::new(r"\b(chronic|months|years)\b", "Persistent pain beyond tissue healing time", Severity::Moderate)
                    .recommend("Pain neuroscience education")
                    .risk("chronicity", Severity::Moderate),
            )
            .rule(
                FileRuleConfig::new(r"\b(burning|tingling|numb\w*)\b", "Neuropathic pain features", Severity::High)
                    .escalate()
                    .recommend("Review neuropathic pain medication")
                    .urgency(Urgency::SemiUrgent),
            )
            .rule(
                FileRuleConfig::new(r"\b(opioid|tramadol|codeine)\b", "Opioid use reported", Severity::Moderate)
                    .recommend("Medication review with tapering plan")
                    .risk("medication", Severity::Moderate),
            ),
        FileSpecialistConfig::new("sleep", "sleep")
            .keywords(&["sleep", "insomnia", "waking", "tired", "fatigue", "night"])
            .fields(&["sleep_hours", "sleep_quality"])
            .related(&["psychology"])
            .rule(
                FileRuleConfig::new(r"\b(waking|wake up|night)\b", "Sleep fragmentation", Severity::Moderate)
                    .recommend("Sleep hygiene education"),
            )
            .rule(
                FileRuleConfig::new(r"\b(snor\w*|apnoea|apnea)\b", "Possible sleep-disordered breathing", Severity::High)
                    .escalate()
                    .recommend("Refer for sleep study")
                    .refer("triage"),
            ),
        FileSpecialistConfig::new("psychology", "psychology")
            .keywords(&["anxiety", "depression", "stress", "mood", "worry", "fear"])
            .fields(&["mood_score", "stressors"])
            .related(&["pain", "sleep"])
            .rule(
                FileRuleConfig::new(r"\b(fear|avoid\w*)\b", "Fear-avoidance beliefs", Severity::Moderate)
                    .recommend("Graded exposure to feared activities")
                    .risk("psychosocial", Severity::Moderate),
            )
            .rule(
                FileRuleConfig::new(r"\b(hopeless|suicid\w*|self[- ]harm)\b", "Risk of self-harm", Severity::High)
                    .escalate()
                    .urgency(Urgency::Emergency)
                    .recommend("Same-day mental health crisis assessment"),
            ),
    ]
}

/// Issues in the specialist table: duplicates, broken rules, dangling references.
pub(super) fn validate_specialists(
    specialists: &[FileSpecialistConfig],
    triage: &SpecialistId,
    defaults: &[SpecialistId],
) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen: BTreeSet<SpecialistId> = BTreeSet::new();

    for specialist in specialists {
        let id = SpecialistId::new(specialist.id.trim());
        if id.as_str().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::IncompleteSpecialist,
                "specialists: entry with an empty id",
            ));
            continue;
        }
        if !seen.insert(id.clone()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateSpecialist,
                format!("specialists: '{}' is declared more than once", id),
            ));
        }

        match specialist.kind {
            SpecialistKind::Http if specialist.endpoint.is_none() => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::IncompleteSpecialist,
                    format!("specialists.{}: kind = \"http\" requires an endpoint", id),
                ));
            }
            SpecialistKind::Rules if specialist.rules.is_empty() => {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::IncompleteSpecialist,
                    format!(
                        "specialists.{}: no rules configured; it will never report findings",
                        id
                    ),
                ));
            }
            _ => {}
        }

        for rule in &specialist.rules {
            if let Err(e) = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidPattern,
                    format!("specialists.{}: invalid pattern '{}': {}", id, rule.pattern, e),
                ));
            }
            if let Some(c) = rule.confidence
                && !(0.0..=1.0).contains(&c)
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ThresholdOutOfRange,
                    format!("specialists.{}: rule confidence {} is outside 0..1", id, c),
                ));
            }
        }
    }

    if !seen.contains(triage) {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::UnknownTriageSpecialist,
            format!("consultation.triage_specialist: '{}' is not registered", triage),
        ));
    }
    for default in defaults.iter().filter(|d| !seen.contains(*d)) {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::UnknownDefaultSpecialist,
            format!("consultation.default_specialists: '{}' is not registered", default),
        ));
    }

    // Dangling questions and referrals degrade to visible gaps at run time.
    for specialist in specialists {
        for rule in &specialist.rules {
            let targets = rule
                .refer
                .iter()
                .chain(rule.question.as_ref().map(|q| &q.target));
            for target in targets {
                if !seen.contains(&SpecialistId::new(target.trim())) {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::UnknownReference,
                        format!(
                            "specialists.{}: rule '{}' refers to unregistered specialist '{}'",
                            specialist.id, rule.finding, target
                        ),
                    ));
                }
            }
        }
    }

    issues
}
