//! Configuration file loading for case-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNCIL_` environment variables (`__` separates nested keys)
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. Global config: `$XDG_CONFIG_HOME/case-council/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileConsultationConfig, FileLoggingConfig, FileMetricRule, FileMilestoneConfig,
    FileOutputConfig, FileOutputFormat, FileQuestionConfig, FileRiskConfig, FileRuleConfig,
    FileSpecialistConfig, FileStoreConfig, SpecialistKind, default_specialists,
};
pub use loader::ConfigLoader;
