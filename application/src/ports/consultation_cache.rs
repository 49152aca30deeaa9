//! Consultation cache port
//!
//! Maps a case fingerprint to its in-flight or completed session. Writes are
//! versioned so a background completion and a foreground write on the same
//! fingerprint never interleave partial state: every write names the version
//! it replaces.

use async_trait::async_trait;
use council_domain::{CaseFingerprint, ConsultationSession};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Write conflict on {fingerprint}: expected version {expected:?}, found {found:?}")]
    WriteConflict {
        fingerprint: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// A cached session with its write version.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub session: ConsultationSession,
    pub version: u64,
}

#[async_trait]
pub trait ConsultationCache: Send + Sync {
    async fn get(&self, fingerprint: &CaseFingerprint) -> Option<CacheEntry>;

    /// Write `session` under its fingerprint if the current version is
    /// `expected` (`None` = no entry yet). Returns the new version.
    async fn compare_and_swap(
        &self,
        expected: Option<u64>,
        session: ConsultationSession,
    ) -> Result<u64, CacheError>;

    /// Number of fingerprints held
    async fn len(&self) -> usize;
}

/// Result of [`write_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    /// The session now occupies the fingerprint at this version.
    Written(u64),
    /// A different, more recently created session holds the fingerprint and
    /// was left in place at this version.
    Superseded(u64),
}

/// Write `session`, re-reading the current version on conflict.
///
/// The same session always overwrites its own entry, and a newer session
/// replaces an older one. An older session never replaces a newer one, so a
/// slow background completion cannot clobber a later consultation of the
/// same case. Conflicts are retried up to `retries` times and never
/// surfaced; only an unavailable cache or exhausted retries return an error.
pub async fn write_session(
    cache: &dyn ConsultationCache,
    session: &ConsultationSession,
    retries: u32,
) -> Result<CacheWrite, CacheError> {
    let mut attempt = 0;
    loop {
        let current = cache.get(session.fingerprint()).await;
        if let Some(entry) = &current
            && entry.session.id() != session.id()
            && entry.session.created_at() > session.created_at()
        {
            tracing::debug!(
                fingerprint = %session.fingerprint(),
                session_id = %session.id(),
                cached = %entry.session.id(),
                "newer session cached, skipping write"
            );
            return Ok(CacheWrite::Superseded(entry.version));
        }
        let expected = current.map(|e| e.version);
        match cache.compare_and_swap(expected, session.clone()).await {
            Ok(version) => return Ok(CacheWrite::Written(version)),
            Err(CacheError::WriteConflict { .. }) if attempt < retries => {
                attempt += 1;
                tracing::debug!(
                    fingerprint = %session.fingerprint(),
                    attempt,
                    "cache write conflict, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }
}
