//! Milestone configuration from TOML (`[milestone]` section)
//!
//! ```toml
//! [milestone]
//! adherence_threshold = 0.7
//! default_improvement_threshold = 0.2
//!
//! [[milestone.metrics]]
//! name = "odi_score"
//! direction = "lower"
//! improvement_threshold = 0.25
//! ```

use council_domain::{ConfigIssue, ConfigIssueCode, MetricDirection, MetricRule, MilestonePolicy};
use serde::{Deserialize, Serialize};

/// One per-metric rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetricRule {
    pub name: String,
    pub direction: MetricDirection,
    /// Falls back to the section default when omitted
    #[serde(default)]
    pub improvement_threshold: Option<f64>,
}

/// Raw milestone configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMilestoneConfig {
    pub adherence_threshold: f64,
    pub default_improvement_threshold: f64,
    /// Name fragments marking a metric as lower-is-better
    pub lower_is_better_terms: Vec<String>,
    pub lower_is_better_threshold: f64,
    pub metrics: Vec<FileMetricRule>,
}

impl Default for FileMilestoneConfig {
    fn default() -> Self {
        let policy = MilestonePolicy::default();
        Self {
            adherence_threshold: policy.adherence_threshold,
            default_improvement_threshold: policy.default_improvement_threshold,
            lower_is_better_terms: policy.lower_is_better_terms,
            lower_is_better_threshold: policy.lower_is_better_threshold,
            metrics: Vec::new(),
        }
    }
}

impl FileMilestoneConfig {
    pub fn to_policy(&self) -> MilestonePolicy {
        let base = MilestonePolicy {
            adherence_threshold: self.adherence_threshold,
            default_improvement_threshold: self.default_improvement_threshold,
            lower_is_better_terms: self
                .lower_is_better_terms
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            lower_is_better_threshold: self.lower_is_better_threshold,
            rules: Vec::new(),
        };
        self.metrics.iter().fold(base, |policy, rule| {
            policy.with_rule(MetricRule::new(
                rule.name.clone(),
                rule.direction,
                rule.improvement_threshold
                    .unwrap_or(self.default_improvement_threshold),
            ))
        })
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut thresholds = vec![
            (
                "milestone.adherence_threshold".to_string(),
                self.adherence_threshold,
            ),
            (
                "milestone.default_improvement_threshold".to_string(),
                self.default_improvement_threshold,
            ),
            (
                "milestone.lower_is_better_threshold".to_string(),
                self.lower_is_better_threshold,
            ),
        ];
        for rule in &self.metrics {
            if let Some(t) = rule.improvement_threshold {
                thresholds.push((format!("milestone.metrics[{}]", rule.name), t));
            }
        }

        thresholds
            .into_iter()
            .filter(|(_, value)| !(0.0..=1.0).contains(value))
            .map(|(field, value)| {
                ConfigIssue::error(
                    ConfigIssueCode::ThresholdOutOfRange,
                    format!("{}: {} is outside 0..1", field, value),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_round_trip() {
        let config = FileMilestoneConfig::default();
        assert_eq!(config.to_policy(), MilestonePolicy::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_metric_rules() {
        let config: FileMilestoneConfig = toml::from_str(
            r#"
adherence_threshold = 0.8

[[metrics]]
name = "odi_score"
direction = "lower"
improvement_threshold = 0.25

[[metrics]]
name = "walking_distance"
direction = "higher"
"#,
        )
        .unwrap();

        let policy = config.to_policy();
        assert_eq!(policy.adherence_threshold, 0.8);

        let odi = policy.rule_for("odi_score");
        assert_eq!(odi.direction, MetricDirection::Lower);
        assert_eq!(odi.improvement_threshold, 0.25);

        let walking = policy.rule_for("walking_distance");
        assert_eq!(walking.direction, MetricDirection::Higher);
        assert_eq!(walking.improvement_threshold, 0.2);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let config = FileMilestoneConfig {
            adherence_threshold: 1.5,
            metrics: vec![FileMetricRule {
                name: "pain".to_string(),
                direction: MetricDirection::Lower,
                improvement_threshold: Some(-0.1),
            }],
            ..Default::default()
        };
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(
            issues
                .iter()
                .all(|i| i.code == ConfigIssueCode::ThresholdOutOfRange)
        );
    }
}
