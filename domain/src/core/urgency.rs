//! Urgency classification shared by routing, synthesis and monitoring.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::string::{contains_word, normalize_phrase};

/// Keywords that force an emergency classification regardless of other signal.
pub const EMERGENCY_KEYWORDS: &[&str] = &["immediate", "emergency"];
const URGENT_KEYWORDS: &[&str] = &["urgent", "severe", "acute", "rapidly worsening"];
const SEMI_URGENT_KEYWORDS: &[&str] = &["semi urgent", "soon", "worsening", "progressive"];
/// Phrases containing the word "urgent" that do not mean urgent.
const SEMI_URGENT_PHRASES: &[&str] = &["semi urgent", "non urgent", "not urgent"];

/// How quickly a case must be acted upon.
///
/// Ordered so that `Emergency > Urgent > SemiUrgent > Routine`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Routine,
    SemiUrgent,
    Urgent,
    Emergency,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::SemiUrgent => "semi_urgent",
            Urgency::Urgent => "urgent",
            Urgency::Emergency => "emergency",
        }
    }

    /// Classify free text by keyword presence.
    ///
    /// Emergency keywords win over everything else. Returns `None` when no
    /// urgency keyword occurs at all.
    pub fn from_keywords(text: &str) -> Option<Urgency> {
        let hit = |words: &[&str]| words.iter().any(|w| contains_word(text, w));
        if hit(EMERGENCY_KEYWORDS) {
            Some(Urgency::Emergency)
        } else if URGENT_KEYWORDS
            .iter()
            .any(|w| contains_word(&without_semi_urgent_phrases(text), w))
        {
            Some(Urgency::Urgent)
        } else if hit(SEMI_URGENT_KEYWORDS) {
            Some(Urgency::SemiUrgent)
        } else {
            None
        }
    }

    /// Whether this urgency calls for the short checkpoint cadence.
    pub fn is_time_critical(&self) -> bool {
        matches!(self, Urgency::Urgent | Urgency::Emergency)
    }

    /// Days until the first progress checkpoint.
    ///
    /// Emergency/urgent cases: 3-7 days. Routine cases: 7-14 days.
    pub fn checkpoint_interval_days(&self) -> u32 {
        match self {
            Urgency::Emergency => 3,
            Urgency::Urgent => 7,
            Urgency::SemiUrgent => 10,
            Urgency::Routine => 14,
        }
    }
}

/// Drop phrases such as "semi-urgent" so their "urgent" does not count as urgent.
fn without_semi_urgent_phrases(text: &str) -> String {
    let mut padded = format!(" {} ", normalize_phrase(text));
    for phrase in SEMI_URGENT_PHRASES {
        let needle = format!(" {} ", phrase);
        while padded.contains(&needle) {
            padded = padded.replacen(&needle, " ", 1);
        }
    }
    padded
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "routine" => Ok(Urgency::Routine),
            "semi_urgent" | "semiurgent" => Ok(Urgency::SemiUrgent),
            "urgent" => Ok(Urgency::Urgent),
            "emergency" => Ok(Urgency::Emergency),
            _ => Err(format!(
                "Invalid urgency: {}. Valid: routine, semi_urgent, urgent, emergency",
                s
            )),
        }
    }
}
