//! Application-level configuration.
//!
//! - [`ConsultationParams`]: dispatch deadlines and cache retry policy
//! - [`MilestonePolicy`]: checkpoint thresholds (a domain type, re-exported here
//!   because use cases receive it alongside the params)

pub mod consultation_params;

pub use consultation_params::ConsultationParams;
pub use council_domain::MilestonePolicy;
