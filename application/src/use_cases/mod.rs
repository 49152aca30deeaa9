//! Use cases (application services)
//!
//! Use cases orchestrate the domain logic and coordinate with
//! external systems through ports.

pub mod evaluate_milestone;
pub mod run_consultation;
pub(crate) mod shared;
