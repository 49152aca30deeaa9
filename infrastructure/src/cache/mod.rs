//! Consultation cache adapters

mod memory;

pub use memory::InMemoryConsultationCache;
