//! Consultation parameters: dispatch deadlines and cache policy.
//!
//! [`ConsultationParams`] groups the static parameters that control
//! [`RunConsultationUseCase`](crate::use_cases::run_consultation::RunConsultationUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatch control parameters.
///
/// | Deadline | Applies to |
/// |----------|------------|
/// | `specialist_timeout` | each specialist call, including triage in normal mode |
/// | `session_deadline` | the whole fan-in; outstanding calls become `timeout` |
/// | `fast_path_deadline` | the triage call in fast mode |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationParams {
    pub specialist_timeout: Duration,
    pub session_deadline: Duration,
    pub fast_path_deadline: Duration,
    /// Retries after a cache write conflict.
    pub cache_write_retries: u32,
}

impl Default for ConsultationParams {
    fn default() -> Self {
        Self {
            specialist_timeout: Duration::from_secs(30),
            session_deadline: Duration::from_secs(60),
            fast_path_deadline: Duration::from_secs(5),
            cache_write_retries: 3,
        }
    }
}

impl ConsultationParams {
    // ==================== Builder Methods ====================

    pub fn with_specialist_timeout(mut self, timeout: Duration) -> Self {
        self.specialist_timeout = timeout;
        self
    }

    pub fn with_session_deadline(mut self, deadline: Duration) -> Self {
        self.session_deadline = deadline;
        self
    }

    pub fn with_fast_path_deadline(mut self, deadline: Duration) -> Self {
        self.fast_path_deadline = deadline;
        self
    }

    pub fn with_cache_write_retries(mut self, retries: u32) -> Self {
        self.cache_write_retries = retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ConsultationParams::default();
        assert_eq!(params.specialist_timeout, Duration::from_secs(30));
        assert!(params.session_deadline >= params.specialist_timeout);
        assert!(params.fast_path_deadline < params.specialist_timeout);
        assert_eq!(params.cache_write_retries, 3);
    }

    #[test]
    fn test_builder() {
        let params = ConsultationParams::default()
            .with_specialist_timeout(Duration::from_millis(200))
            .with_session_deadline(Duration::from_secs(1))
            .with_cache_write_retries(0);

        assert_eq!(params.specialist_timeout, Duration::from_millis(200));
        assert_eq!(params.session_deadline, Duration::from_secs(1));
        assert_eq!(params.cache_write_retries, 0);
    }
}
