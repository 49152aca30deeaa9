//! Case value object
//!
//! A [`Case`] is the immutable input to a consultation: partially populated
//! structured fields, an optional free-text query, an optional urgency hint
//! and the baseline values of any metrics that will be tracked later.

use super::error::DomainError;
use super::urgency::Urgency;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Identifier of a submitted case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable key identifying a case's content; used to key the consultation cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseFingerprint(String);

impl CaseFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A case submitted for consultation (Value Object)
///
/// Fields are private and only set at construction time, so a case is
/// immutable once submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    id: CaseId,
    #[serde(default)]
    structured_fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    urgency_hint: Option<Urgency>,
    /// Baseline values for metrics tracked at later checkpoints (e.g. `pain` = 8)
    #[serde(default)]
    baseline_metrics: BTreeMap<String, f64>,
}

impl Case {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(id),
            structured_fields: BTreeMap::new(),
            raw_query: None,
            urgency_hint: None,
            baseline_metrics: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.structured_fields.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.raw_query = Some(query.into());
        self
    }

    pub fn with_urgency_hint(mut self, urgency: Urgency) -> Self {
        self.urgency_hint = Some(urgency);
        self
    }

    pub fn with_baseline(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.baseline_metrics.insert(metric.into(), value);
        self
    }

    /// Validate a case received from outside (e.g. deserialised from JSON).
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.as_str().trim().is_empty() {
            return Err(DomainError::InvalidCase("case id cannot be empty".to_string()));
        }
        let has_query = self
            .raw_query
            .as_deref()
            .is_some_and(|q| !q.trim().is_empty());
        if !has_query && self.populated_fields().next().is_none() {
            return Err(DomainError::InvalidCase(format!(
                "case {} has neither a query nor any populated field",
                self.id
            )));
        }
        Ok(())
    }

    pub fn id(&self) -> &CaseId {
        &self.id
    }

    pub fn structured_fields(&self) -> &BTreeMap<String, Value> {
        &self.structured_fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.structured_fields.get(name).filter(|v| is_populated(v))
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn urgency_hint(&self) -> Option<Urgency> {
        self.urgency_hint
    }

    pub fn baseline_metrics(&self) -> &BTreeMap<String, f64> {
        &self.baseline_metrics
    }

    /// Names of the structured fields that carry a value.
    pub fn populated_fields(&self) -> impl Iterator<Item = &str> {
        self.structured_fields
            .iter()
            .filter(|(_, v)| is_populated(v))
            .map(|(k, _)| k.as_str())
    }

    /// Fraction (0..1) of the declared structured fields that are populated.
    pub fn completeness(&self) -> f64 {
        if self.structured_fields.is_empty() {
            return 0.0;
        }
        self.populated_fields().count() as f64 / self.structured_fields.len() as f64
    }

    /// Fraction (0..1) of `relevant` field names that are populated on this case.
    ///
    /// Falls back to [`Case::completeness`] when no relevant fields are named.
    pub fn completeness_over(&self, relevant: &BTreeSet<String>) -> f64 {
        if relevant.is_empty() {
            return self.completeness();
        }
        let present = relevant.iter().filter(|f| self.field(f).is_some()).count();
        present as f64 / relevant.len() as f64
    }

    /// All text a specialist or the router may scan: the query plus `name: value` lines.
    pub fn text_corpus(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        if let Some(q) = &self.raw_query {
            lines.push(q.clone());
        }
        for (name, value) in &self.structured_fields {
            if is_populated(value) {
                lines.push(format!("{}: {}", name, value_text(value)));
            }
        }
        lines.join("\n")
    }

    /// Content fingerprint: identical submissions map to the same cache entry.
    pub fn fingerprint(&self) -> CaseFingerprint {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        for (name, value) in &self.structured_fields {
            name.hash(&mut hasher);
            value.to_string().hash(&mut hasher);
        }
        self.raw_query.hash(&mut hasher);
        self.urgency_hint.hash(&mut hasher);
        CaseFingerprint(format!("{}-{:016x}", self.id, hasher.finish()))
    }

    /// Build the follow-up case used for re-triage at a checkpoint.
    ///
    /// Progress metrics overwrite same-named fields; new symptoms and concerns
    /// are appended to the query. The original case is left untouched.
    pub fn follow_up(
        &self,
        checkpoint_day: u32,
        progress_metrics: &BTreeMap<String, f64>,
        notes: &[String],
    ) -> Case {
        let mut next = self.clone();
        next.id = CaseId::new(format!("{}-day{}", self.id, checkpoint_day));
        for (metric, value) in progress_metrics {
            next.structured_fields
                .insert(metric.clone(), Value::from(*value));
        }
        if !notes.is_empty() {
            let addendum = format!("Day {} update: {}", checkpoint_day, notes.join("; "));
            next.raw_query = Some(match &self.raw_query {
                Some(q) => format!("{}\n{}", q, addendum),
                None => addendum,
            });
        }
        next
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Case {
        Case::new("case-1")
            .with_query("Chronic low back pain with poor sleep")
            .with_field("pain_level", 8)
            .with_field("sleep_hours", json!(null))
            .with_field("medications", json!(["ibuprofen"]))
            .with_field("occupation", "")
            .with_baseline("pain", 8.0)
    }

    #[test]
    fn test_completeness_counts_populated_fields() {
        let case = sample();
        // pain_level + medications populated out of 4 declared
        assert!((case.completeness() - 0.5).abs() < 1e-9);
        assert_eq!(Case::new("x").completeness(), 0.0);
    }

    #[test]
    fn test_completeness_over_relevant_fields() {
        let case = sample();
        let relevant: BTreeSet<String> = ["pain_level", "sleep_hours", "imaging"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!((case.completeness_over(&relevant) - 1.0 / 3.0).abs() < 1e-9);
        assert!((case.completeness_over(&BTreeSet::new()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());
        assert!(Case::new("  ").with_query("pain").validate().is_err());
        assert!(Case::new("empty").validate().is_err());
        assert!(Case::new("fields-only").with_field("age", 40).validate().is_ok());
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
        let changed = sample().with_field("pain_level", 9);
        assert_ne!(sample().fingerprint(), changed.fingerprint());
        assert!(sample().fingerprint().as_str().starts_with("case-1-"));
    }

    #[test]
    fn test_text_corpus_includes_query_and_fields() {
        let corpus = sample().text_corpus();
        assert!(corpus.contains("Chronic low back pain"));
        assert!(corpus.contains("pain_level: 8"));
        assert!(corpus.contains("medications: ibuprofen"));
        assert!(!corpus.contains("sleep_hours"));
    }

    #[test]
    fn test_follow_up_case() {
        let case = sample();
        let metrics = BTreeMap::from([("pain".to_string(), 7.0)]);
        let next = case.follow_up(14, &metrics, &["new numbness in left leg".to_string()]);

        assert_eq!(next.id().as_str(), "case-1-day14");
        assert_eq!(next.field("pain"), Some(&json!(7.0)));
        assert!(next.raw_query().unwrap().contains("numbness"));
        // Original untouched
        assert!(case.field("pain").is_none());
    }

    #[test]
    fn test_deserialize_partial_case() {
        let case: Case = serde_json::from_str(
            r#"{"id": "c-9", "raw_query": "knee swelling", "urgency_hint": "urgent"}"#,
        )
        .unwrap();
        assert_eq!(case.urgency_hint(), Some(Urgency::Urgent));
        assert!(case.structured_fields().is_empty());
    }
}
