//! Milestone tracking
//!
//! A checkpoint compares progress metrics against the baseline captured with
//! the case. Adherence is judged first; a protocol that was not followed says
//! nothing about whether the plan works.

mod assess;
mod policy;

pub use assess::{MetricProgress, MilestoneAssessment, assess};
pub use policy::{MetricDirection, MetricRule, MilestonePolicy};

use crate::core::error::DomainError;
use crate::session::{SessionId, current_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name under which adherence may also be reported as a metric.
pub const ADHERENCE_METRIC: &str = "adherence";

/// Latest checkpoint day accepted in a progress update (ten years).
pub const MAX_CHECKPOINT_DAY: u32 = 3650;

/// Progress data submitted at a checkpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub checkpoint_day: u32,
    #[serde(default)]
    pub progress_metrics: BTreeMap<String, f64>,
    /// Protocol adherence (0..1); falls back to the `adherence` metric
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adherence: Option<f64>,
    #[serde(default)]
    pub new_symptoms: Vec<String>,
    #[serde(default)]
    pub concern_flags: Vec<String>,
}

impl ProgressUpdate {
    pub fn new(checkpoint_day: u32) -> Self {
        Self {
            checkpoint_day,
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.progress_metrics.insert(name.into(), value);
        self
    }

    pub fn with_adherence(mut self, adherence: f64) -> Self {
        self.adherence = Some(adherence);
        self
    }

    pub fn with_new_symptom(mut self, symptom: impl Into<String>) -> Self {
        self.new_symptoms.push(symptom.into());
        self
    }

    pub fn with_concern(mut self, concern: impl Into<String>) -> Self {
        self.concern_flags.push(concern.into());
        self
    }

    pub fn adherence(&self) -> Option<f64> {
        self.adherence
            .or_else(|| self.progress_metrics.get(ADHERENCE_METRIC).copied())
    }

    /// New symptoms and concerns, for the follow-up case.
    pub fn notes(&self) -> Vec<String> {
        self.new_symptoms
            .iter()
            .map(|s| format!("new symptom: {}", s))
            .chain(self.concern_flags.iter().map(|c| format!("concern: {}", c)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.checkpoint_day == 0 {
            return Err(DomainError::InvalidProgress(
                "checkpoint_day must be at least 1".to_string(),
            ));
        }
        if self.checkpoint_day > MAX_CHECKPOINT_DAY {
            return Err(DomainError::InvalidProgress(format!(
                "checkpoint_day {} exceeds {}",
                self.checkpoint_day, MAX_CHECKPOINT_DAY
            )));
        }
        if let Some((name, _)) = self.progress_metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DomainError::InvalidProgress(format!(
                "metric '{}' is not a finite number",
                name
            )));
        }
        if let Some(a) = self.adherence().filter(|a| !(0.0..=1.0).contains(a)) {
            return Err(DomainError::InvalidProgress(format!(
                "adherence {} is outside 0..1",
                a
            )));
        }
        Ok(())
    }
}

/// Outcome classification of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    OnTrack,
    /// Protocol followed but not working
    Concerning,
    /// Protocol not followed
    NeedsAttention,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::OnTrack => "on_track",
            ProgressStatus::Concerning => "concerning",
            ProgressStatus::NeedsAttention => "needs_attention",
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable record of one checkpoint evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneReport {
    pub session_id: SessionId,
    pub checkpoint_day: u32,
    pub progress_metrics: BTreeMap<String, f64>,
    pub progress_status: ProgressStatus,
    pub reassessment_triggered: bool,
    #[serde(default)]
    pub metric_evaluations: Vec<MetricProgress>,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub adjusted_recommendations: Vec<String>,
    pub next_checkpoint_day: u32,
    /// Follow-on session created by a reassessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_session: Option<SessionId>,
    pub created_at: u64,
}

impl MilestoneReport {
    /// Report without a reassessment outcome attached yet.
    pub fn new(
        session_id: SessionId,
        update: &ProgressUpdate,
        assessment: MilestoneAssessment,
        interval_days: u32,
    ) -> Self {
        Self {
            session_id,
            checkpoint_day: update.checkpoint_day,
            progress_metrics: update.progress_metrics.clone(),
            progress_status: assessment.progress_status,
            reassessment_triggered: assessment.reassessment_triggered,
            metric_evaluations: assessment.metrics,
            reasons: assessment.reasons,
            adjusted_recommendations: Vec::new(),
            next_checkpoint_day: update.checkpoint_day.saturating_add(interval_days),
            follow_up_session: None,
            created_at: current_timestamp(),
        }
    }

    /// Attach the outcome of the follow-on consultation.
    pub fn with_reassessment(
        mut self,
        follow_up: SessionId,
        recommendations: Vec<String>,
    ) -> Self {
        self.follow_up_session = Some(follow_up);
        self.adjusted_recommendations = recommendations;
        self
    }
}
