//! Specialist adapters and the table builder
//!
//! [`build_specialist_table`] turns the `[[specialists]]` configuration into
//! the static [`SpecialistTable`] the consultation use case runs against.

mod rules;

#[cfg(feature = "http-specialists")]
mod http;

#[cfg(feature = "http-specialists")]
pub use http::HttpSpecialist;
pub use rules::{NO_FINDINGS, RuleSpecialist};

use crate::config::{FileConfig, SpecialistKind};
use council_application::{SpecialistPort, SpecialistTable, SpecialistTableError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors building specialists from configuration
#[derive(Error, Debug)]
pub enum SpecialistBuildError {
    #[error("Specialist '{specialist}': invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        specialist: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Specialist '{0}' has kind = \"http\" but no endpoint")]
    MissingEndpoint(String),

    #[error(
        "Specialist '{0}' has kind = \"http\" but case-council was built without the `http-specialists` feature"
    )]
    HttpDisabled(String),

    #[error(transparent)]
    Table(#[from] SpecialistTableError),
}

/// Build the static specialist table from configuration.
pub fn build_specialist_table(config: &FileConfig) -> Result<SpecialistTable, SpecialistBuildError> {
    let mut specialists: Vec<Arc<dyn SpecialistPort>> = Vec::with_capacity(config.specialists.len());

    for entry in &config.specialists {
        let specialist: Arc<dyn SpecialistPort> = match entry.kind {
            SpecialistKind::Rules => Arc::new(RuleSpecialist::from_config(entry)?),
            SpecialistKind::Http => build_http(entry)?,
        };
        specialists.push(specialist);
    }

    let table = SpecialistTable::new(
        specialists,
        config.consultation.triage_id(),
        config.consultation.default_ids(),
    )?;
    info!(
        specialists = table.len(),
        triage = %table.triage_id(),
        "specialist table built"
    );
    Ok(table)
}

#[cfg(feature = "http-specialists")]
fn build_http(
    entry: &crate::config::FileSpecialistConfig,
) -> Result<Arc<dyn SpecialistPort>, SpecialistBuildError> {
    let endpoint = entry
        .endpoint
        .clone()
        .ok_or_else(|| SpecialistBuildError::MissingEndpoint(entry.id.clone()))?;
    Ok(Arc::new(HttpSpecialist::new(entry.profile(), endpoint)))
}

#[cfg(not(feature = "http-specialists"))]
fn build_http(
    entry: &crate::config::FileSpecialistConfig,
) -> Result<Arc<dyn SpecialistPort>, SpecialistBuildError> {
    Err(SpecialistBuildError::HttpDisabled(entry.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSpecialistConfig;
    use council_domain::SpecialistId;

    #[test]
    fn test_default_config_builds_table() {
        let table = build_specialist_table(&FileConfig::default()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.triage_id().as_str(), "triage");
        assert!(table.get(&SpecialistId::new("sleep")).is_some());
        assert_eq!(
            table.directory().domain_of(&SpecialistId::new("physio")),
            Some("musculoskeletal")
        );
    }

    #[test]
    fn test_missing_triage_is_error() {
        let mut config = FileConfig::default();
        config.specialists.retain(|s| s.id != "triage");
        let err = build_specialist_table(&config).err().unwrap();
        assert!(matches!(
            err,
            SpecialistBuildError::Table(SpecialistTableError::UnknownTriage(_))
        ));
    }

    #[test]
    fn test_duplicate_id_is_error() {
        let mut config = FileConfig::default();
        config
            .specialists
            .push(FileSpecialistConfig::new("physio", "musculoskeletal"));
        let err = build_specialist_table(&config).err().unwrap();
        assert!(matches!(
            err,
            SpecialistBuildError::Table(SpecialistTableError::Duplicate(_))
        ));
    }

    #[cfg(not(feature = "http-specialists"))]
    #[test]
    fn test_http_kind_needs_feature() {
        let mut config = FileConfig::default();
        let mut remote = FileSpecialistConfig::new("remote", "cardiology");
        remote.kind = SpecialistKind::Http;
        remote.endpoint = Some("http://localhost:8080/consult".to_string());
        config.specialists.push(remote);

        let err = build_specialist_table(&config).err().unwrap();
        assert!(matches!(err, SpecialistBuildError::HttpDisabled(_)));
    }
}
