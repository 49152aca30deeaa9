//! Output formatting for consultation results and milestone reports

pub mod console;
pub mod formatter;
