//! Progress reporting for consultations

pub mod reporter;
