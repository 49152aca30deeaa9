//! Rule-profile specialist
//!
//! A deterministic [`SpecialistPort`] driven entirely by configuration. Each
//! rule is a case-insensitive regex over the case's query and structured
//! field values; a match contributes a key finding plus whatever optional
//! recommendation, risk, urgency, question or referral the rule carries.

use crate::config::{FileRuleConfig, FileSpecialistConfig};
use async_trait::async_trait;
use council_application::{ConsultContext, SpecialistError, SpecialistPort};
use council_domain::{
    Case, ConfidenceModel, ConfidenceSignals, HistorySnapshot, KeyFinding, QuestionForOther,
    SpecialistOpinion, SpecialistProfile,
};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::SpecialistBuildError;

/// Finding reported when no rule matches.
pub const NO_FINDINGS: &str = "No domain-specific findings";

struct CompiledRule {
    regex: Regex,
    rule: FileRuleConfig,
}

pub struct RuleSpecialist {
    profile: SpecialistProfile,
    rules: Vec<CompiledRule>,
    model: ConfidenceModel,
}

impl RuleSpecialist {
    pub fn from_config(config: &FileSpecialistConfig) -> Result<Self, SpecialistBuildError> {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledRule {
                        regex,
                        rule: rule.clone(),
                    })
                    .map_err(|source| SpecialistBuildError::InvalidPattern {
                        specialist: config.id.clone(),
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            profile: config.profile(),
            rules,
            model: ConfidenceModel::default(),
        })
    }

    /// Evaluate every rule against the case.
    fn evaluate(&self, case: &Case, confidence: f64) -> SpecialistOpinion {
        let corpus = case.text_corpus();
        let mut opinion = SpecialistOpinion::success(
            self.profile.id.as_str(),
            self.profile.domain.clone(),
            confidence,
        );
        let mut excerpts: Vec<&str> = Vec::new();

        for CompiledRule { regex, rule } in &self.rules {
            let Some(m) = regex.find(&corpus) else {
                continue;
            };
            excerpts.push(m.as_str());

            let mut finding = KeyFinding::new(rule.finding.clone(), rule.severity)
                .with_confidence(rule.confidence.unwrap_or(confidence));
            if rule.escalate {
                finding = finding.escalate();
            }
            opinion = opinion
                .with_primary_finding(rule.finding.clone())
                .with_key_finding(finding);

            if let Some(rec) = &rule.recommendation {
                opinion = opinion.with_recommendation(rec.clone());
            }
            if let Some(risk) = &rule.risk {
                opinion = opinion.with_risk(risk.dimension.clone(), risk.level);
            }
            if let Some(urgency) = rule.urgency {
                // Highest urgency across matching rules
                opinion.urgency = opinion.urgency.max(Some(urgency));
            }
            if let Some(q) = &rule.question {
                opinion = opinion.with_question(
                    QuestionForOther::new(q.target.trim(), q.text.clone()).with_priority(q.priority),
                );
            }
            if let Some(target) = &rule.refer
                && !opinion.suggested_specialists.iter().any(|s| s.as_str() == target.trim())
            {
                opinion = opinion.with_referral(target.trim());
            }
        }

        if excerpts.is_empty() {
            opinion.confidence = (confidence * 0.5).clamp(0.0, 1.0);
            return opinion.with_primary_finding(NO_FINDINGS);
        }

        opinion.with_raw_text(excerpts.join("\n"))
    }
}

#[async_trait]
impl SpecialistPort for RuleSpecialist {
    fn profile(&self) -> &SpecialistProfile {
        &self.profile
    }

    async fn consult(
        &self,
        case: &Case,
        context: &ConsultContext,
    ) -> Result<SpecialistOpinion, SpecialistError> {
        let confidence = self.confidence(case, &context.history);
        let opinion = self.evaluate(case, confidence);
        debug!(
            specialist = %self.profile.id,
            findings = opinion.key_findings.len(),
            prior_answers = context.prior_answers.len(),
            "rule specialist evaluated case"
        );
        Ok(opinion)
    }

    fn confidence(&self, case: &Case, history: &HistorySnapshot) -> f64 {
        let signals = ConfidenceSignals::from_record(
            self.profile.keyword_coverage(&case.text_corpus()),
            history.record(&self.profile.id),
        );
        self.model.score(&signals)
    }
}
