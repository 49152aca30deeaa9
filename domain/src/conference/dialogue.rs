//! Inter-specialist dialogue reconstruction.

use crate::core::string::{normalize_phrase, shares_terms, significant_terms};
use crate::specialist::{Priority, SpecialistId, SpecialistOpinion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of target excerpts quoted in one answer.
const MAX_EXCERPTS: usize = 3;

/// How an answer bears on the asking specialist's assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// The target's findings do not address the question
    None,
    /// The target's findings address the question without contradicting the asker
    Refines,
    /// The target rates a dimension named in the question differently from the asker
    Reverses,
}

/// A question from one specialist paired with the target's relevant findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub from_specialist: SpecialistId,
    pub to_specialist: SpecialistId,
    pub question: String,
    pub answer: String,
    pub impact_on_assessment: Impact,
    pub priority: Priority,
}

/// Build one dialogue entry per question whose target responded successfully.
pub(super) fn build_dialogue(
    opinions: &BTreeMap<&SpecialistId, &SpecialistOpinion>,
) -> Vec<DialogueEntry> {
    let mut dialogue = Vec::new();
    for asker in opinions.values() {
        for q in &asker.questions_for_others {
            let Some(target) = opinions.get(&q.target_specialist_id) else {
                continue;
            };
            if target.specialist_id == asker.specialist_id {
                continue;
            }
            let (answer, impact) = answer_question(asker, target, &q.question);
            dialogue.push(DialogueEntry {
                from_specialist: asker.specialist_id.clone(),
                to_specialist: target.specialist_id.clone(),
                question: q.question.clone(),
                answer,
                impact_on_assessment: impact,
                priority: q.priority,
            });
        }
    }
    dialogue
}

fn answer_question(
    asker: &SpecialistOpinion,
    target: &SpecialistOpinion,
    question: &str,
) -> (String, Impact) {
    let question_terms = significant_terms(question);

    let mut excerpts: Vec<String> = target
        .primary_findings
        .iter()
        .chain(target.key_findings.iter().map(|f| &f.finding))
        .chain(target.recommendations.iter())
        .filter(|text| shares_terms(question, text))
        .take(MAX_EXCERPTS)
        .cloned()
        .collect();

    let mut reverses = false;
    for risk in &target.risk_assessments {
        let dimension_terms = significant_terms(&risk.dimension);
        if !dimension_terms.iter().any(|t| question_terms.contains(t)) {
            continue;
        }
        excerpts.push(format!(
            "{} rates {} risk as {}",
            target.specialist_id, risk.dimension, risk.level
        ));
        let dimension = normalize_phrase(&risk.dimension);
        reverses |= asker
            .risk_assessments
            .iter()
            .any(|own| normalize_phrase(&own.dimension) == dimension && own.level != risk.level);
    }

    if excerpts.is_empty() {
        let answer = format!(
            "No findings from {} address this question directly",
            target.specialist_id
        );
        return (answer, Impact::None);
    }

    let impact = if reverses {
        Impact::Reverses
    } else {
        Impact::Refines
    };
    (excerpts.join("; "), impact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialist::{QuestionForOther, Severity};

    fn index(opinions: &[SpecialistOpinion]) -> BTreeMap<&SpecialistId, &SpecialistOpinion> {
        opinions.iter().map(|o| (&o.specialist_id, o)).collect()
    }

    #[test]
    fn test_question_to_absent_target_is_skipped() {
        let opinions = vec![
            SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                .with_question(QuestionForOther::new("cardio", "Any cardiac limits on exercise?")),
        ];
        assert!(build_dialogue(&index(&opinions)).is_empty());
    }

    #[test]
    fn test_unaddressed_question_has_no_impact() {
        let opinions = vec![
            SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                .with_question(QuestionForOther::new("sleep", "Any cardiac limits on exercise?")),
            SpecialistOpinion::success("sleep", "sleep", 0.7)
                .with_primary_finding("Fragmented sleep"),
        ];
        let dialogue = build_dialogue(&index(&opinions));
        assert_eq!(dialogue.len(), 1);
        assert_eq!(dialogue[0].impact_on_assessment, Impact::None);
        assert!(dialogue[0].answer.contains("No findings from sleep"));
    }

    #[test]
    fn test_conflicting_risk_on_asked_dimension_reverses() {
        let opinions = vec![
            SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                .with_risk("neurological", Severity::High)
                .with_question(
                    QuestionForOther::new("neuro", "Is there neurological compromise?")
                        .with_priority(Priority::High),
                ),
            SpecialistOpinion::success("neuro", "neurology", 0.9)
                .with_primary_finding("Reflexes intact, no neurological deficit")
                .with_risk("neurological", Severity::Low),
        ];
        let dialogue = build_dialogue(&index(&opinions));
        assert_eq!(dialogue[0].impact_on_assessment, Impact::Reverses);
        assert_eq!(dialogue[0].priority, Priority::High);
        assert!(dialogue[0].answer.contains("neuro rates neurological risk as low"));
    }
}
