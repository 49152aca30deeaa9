//! Static specialist capability table.
//!
//! Built once when the orchestrator is constructed and never mutated: the
//! set of consultable specialists, which one triages, and who to fall back
//! to when routing matches nobody.

use crate::ports::specialist::SpecialistPort;
use council_domain::{SpecialistDirectory, SpecialistId};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecialistTableError {
    #[error("Duplicate specialist id: {0}")]
    Duplicate(SpecialistId),

    #[error("Triage specialist '{0}' is not registered")]
    UnknownTriage(SpecialistId),

    #[error("Default specialist set is empty")]
    NoDefaults,

    #[error("Default specialist '{0}' is not registered")]
    UnknownDefault(SpecialistId),
}

/// Immutable map of specialist id to implementation.
#[derive(Clone)]
pub struct SpecialistTable {
    specialists: BTreeMap<SpecialistId, Arc<dyn SpecialistPort>>,
    directory: SpecialistDirectory,
    triage: SpecialistId,
    defaults: Vec<SpecialistId>,
}

impl SpecialistTable {
    pub fn new(
        specialists: Vec<Arc<dyn SpecialistPort>>,
        triage: SpecialistId,
        defaults: Vec<SpecialistId>,
    ) -> Result<Self, SpecialistTableError> {
        let mut map: BTreeMap<SpecialistId, Arc<dyn SpecialistPort>> = BTreeMap::new();
        for specialist in specialists {
            let id = specialist.id().clone();
            if map.insert(id.clone(), specialist).is_some() {
                return Err(SpecialistTableError::Duplicate(id));
            }
        }

        if !map.contains_key(&triage) {
            return Err(SpecialistTableError::UnknownTriage(triage));
        }
        if defaults.is_empty() {
            return Err(SpecialistTableError::NoDefaults);
        }
        if let Some(unknown) = defaults.iter().find(|id| !map.contains_key(*id)) {
            return Err(SpecialistTableError::UnknownDefault(unknown.clone()));
        }

        let directory = SpecialistDirectory::new(map.values().map(|s| s.profile().clone()));
        Ok(Self {
            specialists: map,
            directory,
            triage,
            defaults,
        })
    }

    pub fn get(&self, id: &SpecialistId) -> Option<&Arc<dyn SpecialistPort>> {
        self.specialists.get(id)
    }

    pub fn triage(&self) -> &Arc<dyn SpecialistPort> {
        // Presence checked at construction
        &self.specialists[&self.triage]
    }

    pub fn triage_id(&self) -> &SpecialistId {
        &self.triage
    }

    pub fn defaults(&self) -> &[SpecialistId] {
        &self.defaults
    }

    pub fn directory(&self) -> &SpecialistDirectory {
        &self.directory
    }

    pub fn ids(&self) -> impl Iterator<Item = &SpecialistId> {
        self.specialists.keys()
    }

    pub fn len(&self) -> usize {
        self.specialists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specialists.is_empty()
    }
}

impl std::fmt::Debug for SpecialistTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistTable")
            .field("specialists", &self.specialists.keys().collect::<Vec<_>>())
            .field("triage", &self.triage)
            .field("defaults", &self.defaults)
            .finish()
    }
}
