//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod consultation;
mod logging;
mod milestone;
mod output;
mod specialists;
mod store;

pub use consultation::FileConsultationConfig;
pub use logging::FileLoggingConfig;
pub use milestone::{FileMetricRule, FileMilestoneConfig};
pub use output::{FileOutputConfig, FileOutputFormat};
pub use specialists::{
    FileQuestionConfig, FileRiskConfig, FileRuleConfig, FileSpecialistConfig, SpecialistKind,
    default_specialists,
};
pub use store::FileStoreConfig;

use council_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Triage, defaults and deadlines
    pub consultation: FileConsultationConfig,
    /// Checkpoint thresholds
    pub milestone: FileMilestoneConfig,
    /// The static specialist table
    pub specialists: Vec<FileSpecialistConfig>,
    /// Session persistence
    pub store: FileStoreConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Outcome event logging
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            consultation: FileConsultationConfig::default(),
            milestone: FileMilestoneConfig::default(),
            specialists: default_specialists(),
            store: FileStoreConfig::default(),
            output: FileOutputConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks deadlines, thresholds, the specialist table (duplicates,
    /// incomplete entries, rule patterns) and every id that refers into it.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.consultation.validate());
        issues.extend(self.milestone.validate());
        issues.extend(specialists::validate_specialists(
            &self.specialists,
            &self.consultation.triage_id(),
            &self.consultation.default_ids(),
        ));
        issues
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(ConfigIssue::is_error)
    }
}
