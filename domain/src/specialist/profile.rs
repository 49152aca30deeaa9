//! Specialist identity and static capability profile.

use crate::core::error::DomainError;
use crate::core::string::contains_word;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a specialist (e.g. `"physio"`, `"sleep"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecialistId(String);

impl SpecialistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecialistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SpecialistId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(DomainError::InvalidSpecialistId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for SpecialistId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Static description of a specialist, fixed at orchestrator construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistProfile {
    pub id: SpecialistId,
    /// Clinical domain (e.g. "musculoskeletal", "sleep")
    pub domain: String,
    /// Words in a triage opinion that route a case to this specialist
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Structured case fields this specialist relies on
    #[serde(default)]
    pub relevant_fields: Vec<String>,
    /// Domains considered related (corroboration from them is less novel)
    #[serde(default)]
    pub related_domains: Vec<String>,
}

impl SpecialistProfile {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: SpecialistId::new(id),
            domain: domain.into(),
            keywords: Vec::new(),
            relevant_fields: Vec::new(),
            related_domains: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_relevant_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relevant_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_related_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Whether any routing keyword occurs in `text` as a whole word.
    pub fn matches_text(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| contains_word(text, k))
    }

    /// Fraction of routing keywords found in `text`.
    pub fn keyword_coverage(&self, text: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let hits = self
            .keywords
            .iter()
            .filter(|k| contains_word(text, k))
            .count();
        hits as f64 / self.keywords.len() as f64
    }
}

/// Read-only lookup of every registered specialist's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialistDirectory {
    profiles: BTreeMap<SpecialistId, SpecialistProfile>,
}

impl SpecialistDirectory {
    pub fn new(profiles: impl IntoIterator<Item = SpecialistProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, id: &SpecialistId) -> Option<&SpecialistProfile> {
        self.profiles.get(id)
    }

    pub fn contains(&self, id: &SpecialistId) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &SpecialistProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn domain_of(&self, id: &SpecialistId) -> Option<&str> {
        self.profiles.get(id).map(|p| p.domain.as_str())
    }

    /// Union of the relevant fields of the given specialists.
    pub fn relevant_fields<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a SpecialistId>,
    ) -> BTreeSet<String> {
        ids.into_iter()
            .filter_map(|id| self.profiles.get(id))
            .flat_map(|p| p.relevant_fields.iter().cloned())
            .collect()
    }

    /// Whether two domains are the same or declared related by either side.
    pub fn domains_related(&self, a: &str, b: &str) -> bool {
        if a.eq_ignore_ascii_case(b) {
            return true;
        }
        self.profiles.values().any(|p| {
            (p.domain.eq_ignore_ascii_case(a)
                && p.related_domains.iter().any(|d| d.eq_ignore_ascii_case(b)))
                || (p.domain.eq_ignore_ascii_case(b)
                    && p.related_domains.iter().any(|d| d.eq_ignore_ascii_case(a)))
        })
    }
}
