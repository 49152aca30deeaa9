//! Infrastructure layer for case-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration loading, rule-profile and HTTP
//! specialists, the consultation cache, session stores and outcome logging.

pub mod cache;
pub mod config;
pub mod logging;
pub mod specialists;
pub mod store;

// Re-export commonly used types
pub use cache::InMemoryConsultationCache;
pub use config::{
    ConfigLoader, FileConfig, FileConsultationConfig, FileMilestoneConfig, FileOutputConfig,
    FileOutputFormat, FileSpecialistConfig, SpecialistKind,
};
pub use logging::JsonlRewardSink;
#[cfg(feature = "http-specialists")]
pub use specialists::HttpSpecialist;
pub use specialists::{RuleSpecialist, SpecialistBuildError, build_specialist_table};
pub use store::{FileSessionStore, InMemorySessionStore, StoreError, StoredSession};
