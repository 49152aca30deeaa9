use super::{ADHERENCE_METRIC, MetricDirection, MilestonePolicy, ProgressStatus, ProgressUpdate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Improvement of one metric relative to its baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricProgress {
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    pub direction: MetricDirection,
    /// Fractional improvement; negative when worse
    pub improvement: f64,
    pub threshold: f64,
    pub met: bool,
}

/// Pure outcome of classifying a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneAssessment {
    pub progress_status: ProgressStatus,
    pub reassessment_triggered: bool,
    pub metrics: Vec<MetricProgress>,
    pub reasons: Vec<String>,
}

/// Classify a checkpoint against the case baseline.
///
/// Order of checks:
/// 1. adherence below threshold: `needs_attention`
/// 2. every comparable metric met its threshold: `on_track`
/// 3. otherwise (including no comparable metric): `concerning`
///
/// Missing adherence is treated as adherent. New symptoms or concerns force a
/// reassessment whatever the status.
pub fn assess(
    baseline: &BTreeMap<String, f64>,
    update: &ProgressUpdate,
    policy: &MilestonePolicy,
) -> MilestoneAssessment {
    let metrics: Vec<MetricProgress> = update
        .progress_metrics
        .iter()
        .filter(|(name, _)| name.as_str() != ADHERENCE_METRIC)
        .filter_map(|(name, &current)| {
            let &base = baseline.get(name)?;
            if base == 0.0 {
                return None;
            }
            let rule = policy.rule_for(name);
            let improvement = match rule.direction {
                MetricDirection::Lower => (base - current) / base.abs(),
                MetricDirection::Higher => (current - base) / base.abs(),
            };
            Some(MetricProgress {
                metric: name.clone(),
                baseline: base,
                current,
                direction: rule.direction,
                improvement,
                threshold: rule.improvement_threshold,
                met: improvement >= rule.improvement_threshold,
            })
        })
        .collect();

    let mut reasons = Vec::new();
    let adherent = match update.adherence() {
        Some(a) if a < policy.adherence_threshold => {
            reasons.push(format!(
                "adherence {:.2} below {:.2}",
                a, policy.adherence_threshold
            ));
            false
        }
        _ => true,
    };

    let progress_status = if !adherent {
        ProgressStatus::NeedsAttention
    } else if metrics.is_empty() {
        reasons.push("no tracked metric comparable to baseline".to_string());
        ProgressStatus::Concerning
    } else if metrics.iter().all(|m| m.met) {
        ProgressStatus::OnTrack
    } else {
        for m in metrics.iter().filter(|m| !m.met) {
            reasons.push(format!(
                "{} improved {:.0}% (needs {:.0}%)",
                m.metric,
                m.improvement * 100.0,
                m.threshold * 100.0
            ));
        }
        ProgressStatus::Concerning
    };

    if !update.new_symptoms.is_empty() {
        reasons.push(format!("new symptoms: {}", update.new_symptoms.join(", ")));
    }
    if !update.concern_flags.is_empty() {
        reasons.push(format!("concerns: {}", update.concern_flags.join(", ")));
    }

    let reassessment_triggered = progress_status != ProgressStatus::OnTrack
        || !update.new_symptoms.is_empty()
        || !update.concern_flags.is_empty();

    MilestoneAssessment {
        progress_status,
        reassessment_triggered,
        metrics,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("pain".to_string(), 8.0),
            ("functional_score".to_string(), 40.0),
        ])
    }

    #[test]
    fn test_improving_and_adherent_is_on_track() {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 5.0)
            .with_adherence(0.85);
        let result = assess(&baseline(), &update, &MilestonePolicy::default());

        assert_eq!(result.progress_status, ProgressStatus::OnTrack);
        assert!(!result.reassessment_triggered);
        assert!((result.metrics[0].improvement - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_poor_adherence_needs_attention() {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 7.0)
            .with_adherence(0.55);
        let result = assess(&baseline(), &update, &MilestonePolicy::default());

        assert_eq!(result.progress_status, ProgressStatus::NeedsAttention);
        assert!(result.reassessment_triggered);
    }

    #[test]
    fn test_adherence_checked_before_outcome() {
        // Metrics look great but the protocol was not followed
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 2.0)
            .with_adherence(0.3);
        let result = assess(&baseline(), &update, &MilestonePolicy::default());
        assert_eq!(result.progress_status, ProgressStatus::NeedsAttention);
    }

    #[test]
    fn test_adherent_but_not_improving_is_concerning() {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 5.0)
            .with_metric("functional_score", 42.0)
            .with_adherence(0.9);
        let result = assess(&baseline(), &update, &MilestonePolicy::default());

        assert_eq!(result.progress_status, ProgressStatus::Concerning);
        assert!(result.reassessment_triggered);
        assert_eq!(result.reasons.len(), 1);
        assert!(result.reasons[0].starts_with("functional_score"));
    }

    #[test]
    fn test_new_symptoms_force_reassessment() {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 4.0)
            .with_adherence(0.95)
            .with_new_symptom("numbness");
        let result = assess(&baseline(), &update, &MilestonePolicy::default());

        assert_eq!(result.progress_status, ProgressStatus::OnTrack);
        assert!(result.reassessment_triggered);
    }

    #[test]
    fn test_no_comparable_metrics_is_concerning() {
        let update = ProgressUpdate::new(14)
            .with_metric("sleep_hours", 7.0)
            .with_adherence(0.9);
        let result = assess(&baseline(), &update, &MilestonePolicy::default());
        assert_eq!(result.progress_status, ProgressStatus::Concerning);
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_adherence_metric_is_not_an_outcome() {
        let update = ProgressUpdate::new(14)
            .with_metric("pain", 5.0)
            .with_metric("adherence", 0.9);
        let base = BTreeMap::from([("pain".to_string(), 8.0), ("adherence".to_string(), 1.0)]);
        let result = assess(&base, &update, &MilestonePolicy::default());
        assert_eq!(result.metrics.len(), 1);
        assert_eq!(result.progress_status, ProgressStatus::OnTrack);
    }
}
