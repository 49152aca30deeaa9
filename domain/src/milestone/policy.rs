use serde::{Deserialize, Serialize};

/// Which way a metric moves when the patient improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricDirection {
    /// Lower is better (pain, disability)
    Lower,
    /// Higher is better (function, range of motion)
    Higher,
}

/// Improvement threshold for one named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRule {
    pub name: String,
    pub direction: MetricDirection,
    /// Minimum fractional improvement over baseline, e.g. 0.3 = 30%
    pub improvement_threshold: f64,
}

impl MetricRule {
    pub fn new(name: impl Into<String>, direction: MetricDirection, threshold: f64) -> Self {
        Self {
            name: name.into(),
            direction,
            improvement_threshold: threshold,
        }
    }
}

/// Thresholds used to classify a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePolicy {
    pub adherence_threshold: f64,
    pub default_improvement_threshold: f64,
    /// Metrics whose name contains one of these terms are lower-is-better
    pub lower_is_better_terms: Vec<String>,
    pub lower_is_better_threshold: f64,
    /// Explicit rules, matched by exact name before the term heuristics
    pub rules: Vec<MetricRule>,
}

impl Default for MilestonePolicy {
    fn default() -> Self {
        Self {
            adherence_threshold: 0.7,
            default_improvement_threshold: 0.2,
            lower_is_better_terms: ["pain", "disability", "stiffness", "fatigue"]
                .into_iter()
                .map(String::from)
                .collect(),
            lower_is_better_threshold: 0.3,
            rules: Vec::new(),
        }
    }
}

impl MilestonePolicy {
    pub fn with_rule(mut self, rule: MetricRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Rule for `metric`: explicit rule, else lower-is-better by name, else the default.
    pub fn rule_for(&self, metric: &str) -> MetricRule {
        if let Some(rule) = self.rules.iter().find(|r| r.name.eq_ignore_ascii_case(metric)) {
            return rule.clone();
        }
        let lower = metric.to_lowercase();
        if self.lower_is_better_terms.iter().any(|t| lower.contains(t.as_str())) {
            MetricRule::new(metric, MetricDirection::Lower, self.lower_is_better_threshold)
        } else {
            MetricRule::new(
                metric,
                MetricDirection::Higher,
                self.default_improvement_threshold,
            )
        }
    }
}
