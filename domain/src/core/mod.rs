//! Core domain concepts shared across all subdomains.
//!
//! - [`case::Case`]: the immutable consultation input
//! - [`urgency::Urgency`]: the four-level urgency scale
//! - [`error::DomainError`]: domain-level errors

pub mod case;
pub mod error;
pub mod string;
pub mod urgency;
