//! Specialist domain
//!
//! A specialist is an independent opinion-producing capability. The domain
//! only knows its static [`SpecialistProfile`] and the structured
//! [`SpecialistOpinion`] it returns; how an opinion is produced is an
//! adapter concern.

pub mod opinion;
pub mod profile;

pub use opinion::{
    KeyFinding, OpinionStatus, Priority, QuestionForOther, RiskAssessment, RiskLevel, Severity,
    SpecialistOpinion,
};
pub use profile::{SpecialistDirectory, SpecialistId, SpecialistProfile};
