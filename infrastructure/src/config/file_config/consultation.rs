//! Consultation configuration from TOML (`[consultation]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [consultation]
//! triage_specialist = "triage"
//! default_specialists = ["physio", "pain"]
//! specialist_timeout_ms = 30000
//! session_deadline_ms = 60000
//! fast_path_deadline_ms = 5000
//! cache_write_retries = 3
//! ```

use council_application::ConsultationParams;
use council_domain::{ConfigIssue, ConfigIssueCode, SpecialistId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw consultation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsultationConfig {
    /// Specialist consulted first to route the case
    pub triage_specialist: String,
    /// Specialists used when triage selects nobody or cannot be reached
    pub default_specialists: Vec<String>,
    pub specialist_timeout_ms: u64,
    pub session_deadline_ms: u64,
    pub fast_path_deadline_ms: u64,
    pub cache_write_retries: u32,
}

impl Default for FileConsultationConfig {
    fn default() -> Self {
        let params = ConsultationParams::default();
        Self {
            triage_specialist: "triage".to_string(),
            default_specialists: vec!["physio".to_string(), "pain".to_string()],
            specialist_timeout_ms: params.specialist_timeout.as_millis() as u64,
            session_deadline_ms: params.session_deadline.as_millis() as u64,
            fast_path_deadline_ms: params.fast_path_deadline.as_millis() as u64,
            cache_write_retries: params.cache_write_retries,
        }
    }
}

impl FileConsultationConfig {
    pub fn triage_id(&self) -> SpecialistId {
        SpecialistId::new(self.triage_specialist.trim())
    }

    pub fn default_ids(&self) -> Vec<SpecialistId> {
        self.default_specialists
            .iter()
            .map(|s| SpecialistId::new(s.trim()))
            .collect()
    }

    /// Convert to application-layer parameters.
    pub fn to_params(&self) -> ConsultationParams {
        ConsultationParams::default()
            .with_specialist_timeout(Duration::from_millis(self.specialist_timeout_ms))
            .with_session_deadline(Duration::from_millis(self.session_deadline_ms))
            .with_fast_path_deadline(Duration::from_millis(self.fast_path_deadline_ms))
            .with_cache_write_retries(self.cache_write_retries)
    }

    pub(super) fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (field, value) in [
            ("specialist_timeout_ms", self.specialist_timeout_ms),
            ("session_deadline_ms", self.session_deadline_ms),
            ("fast_path_deadline_ms", self.fast_path_deadline_ms),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidDeadline,
                    format!("consultation.{} cannot be 0", field),
                ));
            }
        }

        if self.session_deadline_ms < self.specialist_timeout_ms {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::InvalidDeadline,
                format!(
                    "consultation.session_deadline_ms ({}) is shorter than specialist_timeout_ms ({}); slow specialists will be cut off by the session deadline",
                    self.session_deadline_ms, self.specialist_timeout_ms
                ),
            ));
        }

        if self.default_specialists.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyDefaults,
                "consultation.default_specialists must name at least one specialist",
            ));
        }

        issues
    }
}
