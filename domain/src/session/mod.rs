//! Consultation session domain
//!
//! - [`entities::ConsultationSession`]: the orchestrator-owned record of one consultation
//! - [`entities::SessionStatus`]: lifecycle states with an append-only transition log

pub mod entities;

pub use entities::{
    ConsultationSession, SessionId, SessionStatus, StatusTransition, current_timestamp,
};
