//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod consultation_cache;
pub mod progress;
pub mod reward_sink;
pub mod session_repository;
pub mod specialist;
