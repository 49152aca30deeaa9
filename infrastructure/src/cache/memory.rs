//! In-process consultation cache keyed by case fingerprint.
//!
//! Every entry carries a version; a write only lands when the caller's
//! expected version matches, so concurrent writers never lose updates
//! silently.

use async_trait::async_trait;
use council_application::{CacheEntry, CacheError, ConsultationCache};
use council_domain::{CaseFingerprint, ConsultationSession};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Default)]
pub struct InMemoryConsultationCache {
    entries: RwLock<HashMap<CaseFingerprint, CacheEntry>>,
}

impl InMemoryConsultationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConsultationCache for InMemoryConsultationCache {
    async fn get(&self, fingerprint: &CaseFingerprint) -> Option<CacheEntry> {
        self.entries.read().await.get(fingerprint).cloned()
    }

    async fn compare_and_swap(
        &self,
        expected: Option<u64>,
        session: ConsultationSession,
    ) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let fingerprint = session.fingerprint().clone();
        let found = entries.get(&fingerprint).map(|e| e.version);
        if found != expected {
            return Err(CacheError::WriteConflict {
                fingerprint: fingerprint.to_string(),
                expected,
                found,
            });
        }

        let version = found.map_or(1, |v| v + 1);
        trace!(fingerprint = %fingerprint, version, status = %session.status(), "cache write");
        entries.insert(fingerprint, CacheEntry { session, version });
        Ok(version)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::{CacheWrite, write_session};
    use council_domain::{Case, RoutingDecision, SpecialistDirectory, SpecialistId};
    use std::sync::Arc;

    fn session(case_id: &str) -> ConsultationSession {
        let case = Case::new(case_id).with_query("knee pain");
        let routing = RoutingDecision::fallback(
            &case,
            &SpecialistDirectory::default(),
            &[SpecialistId::new("physio")],
            "test",
        );
        ConsultationSession::new(case, routing)
    }

    #[tokio::test]
    async fn test_versions_increase() {
        let cache = InMemoryConsultationCache::new();
        let s = session("c1");

        assert_eq!(cache.compare_and_swap(None, s.clone()).await.unwrap(), 1);
        assert_eq!(cache.compare_and_swap(Some(1), s.clone()).await.unwrap(), 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(s.fingerprint()).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let cache = InMemoryConsultationCache::new();
        let s = session("c1");
        cache.compare_and_swap(None, s.clone()).await.unwrap();

        let err = cache.compare_and_swap(None, s.clone()).await.unwrap_err();
        assert_eq!(
            err,
            CacheError::WriteConflict {
                fingerprint: s.fingerprint().to_string(),
                expected: None,
                found: Some(1),
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_writers_all_land() {
        let cache = Arc::new(InMemoryConsultationCache::new());
        let s = session("c1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let s = s.clone();
            handles.push(tokio::spawn(async move {
                write_session(cache.as_ref(), &s, 16).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.get(s.fingerprint()).await.unwrap().version, 8);
    }

    /// Same case, separate session, created `offset_ms` after `base`.
    fn later_session(base: &ConsultationSession, offset_ms: u64) -> ConsultationSession {
        let mut value = serde_json::to_value(session(base.case().id().as_str())).unwrap();
        value["created_at"] = serde_json::json!(base.created_at() + offset_ms);
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_older_session_does_not_replace_newer() {
        let cache = InMemoryConsultationCache::new();
        let older = session("c1");
        let newer = later_session(&older, 1_000);
        assert_eq!(older.fingerprint(), newer.fingerprint());
        assert_ne!(older.id(), newer.id());

        assert_eq!(
            write_session(&cache, &newer, 3).await.unwrap(),
            CacheWrite::Written(1)
        );
        assert_eq!(
            write_session(&cache, &older, 3).await.unwrap(),
            CacheWrite::Superseded(1)
        );
        let cached = cache.get(newer.fingerprint()).await.unwrap();
        assert_eq!(cached.session.id(), newer.id());

        // The cached session still updates its own entry in place
        assert_eq!(
            write_session(&cache, &newer, 3).await.unwrap(),
            CacheWrite::Written(2)
        );
    }

    #[tokio::test]
    async fn test_newer_session_replaces_older() {
        let cache = InMemoryConsultationCache::new();
        let older = session("c1");
        let newer = later_session(&older, 1_000);

        write_session(&cache, &older, 3).await.unwrap();
        assert_eq!(
            write_session(&cache, &newer, 3).await.unwrap(),
            CacheWrite::Written(2)
        );
        assert_eq!(cache.len().await, 1);
        let cached = cache.get(older.fingerprint()).await.unwrap();
        assert_eq!(cached.session.id(), newer.id());
    }
}
