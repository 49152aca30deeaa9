//! Application layer for case-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod specialist_table;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConsultationParams, MilestonePolicy};
pub use ports::{
    consultation_cache::{CacheEntry, CacheError, CacheWrite, ConsultationCache, write_session},
    progress::{ConsultationProgress, NoProgress, Stage},
    reward_sink::{NoRewards, OutcomeSignal, RewardSink},
    session_repository::{RepositoryError, SessionRepository},
    specialist::{ConsultContext, SpecialistError, SpecialistPort},
};
pub use specialist_table::{SpecialistTable, SpecialistTableError};
pub use use_cases::evaluate_milestone::{
    EvaluateMilestoneInput, EvaluateMilestoneUseCase, MilestoneError,
};
pub use use_cases::run_consultation::{
    BackgroundCompletion, ConsultationError, ConsultationMode, ConsultationOutcome,
    ConsultationResponse, MissingSpecialist, ResponseStatus, RunConsultationInput,
    RunConsultationUseCase,
};
