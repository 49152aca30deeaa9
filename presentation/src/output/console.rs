//! Console output formatter for consultation results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::{ConsultationResponse, ResponseStatus};
use council_domain::{
    ConferenceRecord, ConsultationSession, Impact, MilestoneReport, Novelty,
    ProgressStatus, RoutingDecision, Severity, SpecialistOpinion, SynthesizedPlan,
};

/// Formats consultation results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete consultation
    pub fn format(response: &ConsultationResponse) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Specialist Council"));
        output.push('\n');
        output.push_str(&Self::status_block(response));

        let Some(session) = &response.session else {
            output.push_str(&Self::footer());
            return output;
        };

        if let Some(routing) = session.routing() {
            output.push_str(&Self::section_header("Routing"));
            output.push_str(&Self::routing(routing));
        }

        output.push_str(&Self::section_header("Specialist Opinions"));
        for opinion in session.opinions().values() {
            output.push_str(&Self::opinion(opinion));
        }

        if let Some(conference) = session.conference() {
            output.push_str(&Self::section_header("Conference"));
            output.push_str(&Self::conference(conference));
        }

        if let Some(plan) = session.plan() {
            output.push_str(&Self::section_header("Treatment Plan"));
            output.push_str(&Self::plan(plan));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(response: &ConsultationResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the plan only (concise output)
    pub fn format_plan_only(response: &ConsultationResponse) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Council Treatment Plan ===".cyan().bold()
        ));
        output.push_str(&Self::status_block(response));

        match response.session.as_ref().and_then(ConsultationSession::plan) {
            Some(plan) => output.push_str(&Self::plan(plan)),
            None if response.status == ResponseStatus::Processing => {
                output.push_str(&format!(
                    "{}\n",
                    "Specialists are still being consulted; the plan is not ready yet.".dimmed()
                ));
            }
            None => {}
        }

        output
    }

    /// Format a milestone report
    pub fn format_milestone(report: &MilestoneReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            format!("=== Checkpoint: day {} ===", report.checkpoint_day)
                .cyan()
                .bold()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Session:".cyan().bold(),
            report.session_id
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::progress_status(report.progress_status)
        ));

        if !report.metric_evaluations.is_empty() {
            output.push_str(&format!("\n{}\n", "Metrics:".cyan().bold()));
            for m in &report.metric_evaluations {
                let mark = if m.met { "v".green() } else { "x".red() };
                output.push_str(&format!(
                    "  {} {}: {} -> {} ({:+.0}%, target {:.0}%)\n",
                    mark,
                    m.metric,
                    m.baseline,
                    m.current,
                    m.improvement * 100.0,
                    m.threshold * 100.0
                ));
            }
        }

        if !report.reasons.is_empty() {
            output.push_str(&format!("\n{}\n", "Reasons:".yellow().bold()));
            for reason in &report.reasons {
                output.push_str(&format!("  * {}\n", reason));
            }
        }

        if report.reassessment_triggered {
            output.push_str(&format!("\n{}\n", "Reassessment triggered".yellow().bold()));
            if let Some(follow_up) = &report.follow_up_session {
                output.push_str(&format!("  Follow-up session: {}\n", follow_up));
            }
            for rec in &report.adjusted_recommendations {
                output.push_str(&format!("  * {}\n", rec));
            }
        }

        output.push_str(&format!(
            "\n{} day {}\n",
            "Next checkpoint:".dimmed(),
            report.next_checkpoint_day
        ));
        output
    }

    fn status_block(response: &ConsultationResponse) -> String {
        let mut output = String::new();
        let status = match response.status {
            ResponseStatus::Success => "success".green().bold(),
            ResponseStatus::Processing => "processing".yellow().bold(),
            ResponseStatus::Failed => "failed".red().bold(),
        };
        output.push_str(&format!("{} {}\n", "Case:".cyan().bold(), response.case_id));
        if let Some(id) = &response.session_id {
            output.push_str(&format!("{} {}\n", "Session:".cyan().bold(), id));
        }
        output.push_str(&format!("{} {}\n", "Status:".cyan().bold(), status));

        if !response.responded_specialists.is_empty() {
            let names: Vec<String> = response
                .responded_specialists
                .iter()
                .map(ToString::to_string)
                .collect();
            output.push_str(&format!(
                "{} {}\n",
                "Responded:".dimmed(),
                names.join(", ")
            ));
        }
        if !response.missing_specialists.is_empty() {
            let names: Vec<String> = response
                .missing_specialists
                .iter()
                .map(|m| format!("{} ({})", m.specialist_id, m.status))
                .collect();
            output.push_str(&format!(
                "{} {}\n",
                "Missing:".yellow(),
                names.join(", ")
            ));
        }
        if let Some(error) = &response.error {
            output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        }
        output.push('\n');
        output
    }

    fn routing(routing: &RoutingDecision) -> String {
        let mut output = String::new();
        let selected: Vec<&str> = routing
            .selected_specialists
            .iter()
            .map(|s| s.as_str())
            .collect();
        output.push_str(&format!("\nUrgency: {}\n", routing.urgency));
        output.push_str(&format!("Selected: {}\n", selected.join(", ")));
        if !routing.unavailable_specialists.is_empty() {
            let unavailable: Vec<&str> = routing
                .unavailable_specialists
                .iter()
                .map(|s| s.as_str())
                .collect();
            output.push_str(&format!("Unavailable: {}\n", unavailable.join(", ")));
        }
        output.push_str(&format!(
            "Data completeness: {:.0}%\n",
            routing.data_completeness * 100.0
        ));
        for warning in &routing.warnings {
            output.push_str(&format!("{} {}\n", "!".yellow(), warning));
        }
        output
    }

    fn opinion(opinion: &SpecialistOpinion) -> String {
        let title = format!("── {} ({}) ──", opinion.specialist_id, opinion.domain);
        if !opinion.is_success() {
            return format!(
                "\n{}\n{}: {}\n",
                title.red().bold(),
                opinion.status,
                opinion.error.as_deref().unwrap_or("Unknown")
            );
        }

        let mut output = format!(
            "\n{}  confidence {:.2}, {}ms\n",
            title.yellow().bold(),
            opinion.confidence,
            opinion.latency_ms
        );
        for finding in &opinion.key_findings {
            let flag = if finding.requires_escalation { " [escalate]" } else { "" };
            output.push_str(&format!(
                "  * {} ({}){}\n",
                finding.finding,
                Self::severity(finding.clinical_relevance),
                flag.red()
            ));
        }
        if opinion.key_findings.is_empty() {
            for finding in &opinion.primary_findings {
                output.push_str(&format!("  * {}\n", finding));
            }
        }
        for rec in &opinion.recommendations {
            output.push_str(&format!("  {} {}\n", "->".dimmed(), rec));
        }
        output
    }

    fn conference(conference: &ConferenceRecord) -> String {
        let mut output = String::new();

        if !conference.dialogue.is_empty() {
            output.push_str(&format!("\n{}\n", "Dialogue:".cyan().bold()));
            for entry in &conference.dialogue {
                let impact = match entry.impact_on_assessment {
                    Impact::None => "no impact".dimmed(),
                    Impact::Refines => "refines".normal(),
                    Impact::Reverses => "reverses".yellow(),
                };
                output.push_str(&format!(
                    "  {} -> {}: {}\n    {} [{}]\n",
                    entry.from_specialist,
                    entry.to_specialist,
                    entry.question,
                    entry.answer,
                    impact
                ));
            }
        }

        if !conference.disagreements.is_empty() {
            output.push_str(&format!("\n{}\n", "Disagreements:".yellow().bold()));
            for d in &conference.disagreements {
                output.push_str(&format!(
                    "  * {} ({}): {}\n",
                    d.topic,
                    Self::severity(d.severity),
                    d.resolution_note
                ));
            }
        }

        if !conference.emergent_findings.is_empty() {
            output.push_str(&format!("\n{}\n", "Cross-domain findings:".green().bold()));
            for f in &conference.emergent_findings {
                let novelty = match f.novelty {
                    Novelty::High => "high novelty".green(),
                    Novelty::Moderate => "moderate novelty".normal(),
                };
                let domains: Vec<&str> = f.domains.iter().map(String::as_str).collect();
                output.push_str(&format!(
                    "  * {} [{}; {}]\n",
                    f.finding,
                    domains.join(" + "),
                    novelty
                ));
            }
        }

        if output.is_empty() {
            output.push_str(&format!("\n{}\n", "No questions, disagreements or cross-domain findings.".dimmed()));
        }
        output
    }

    fn plan(plan: &SynthesizedPlan) -> String {
        let mut output = String::new();
        let flags = &plan.clinical_flags;

        if flags.requires_immediate_escalation {
            output.push_str(&format!(
                "{}\n",
                format!("!! Immediate escalation required ({})", flags.urgency_level)
                    .red()
                    .bold()
            ));
        } else {
            output.push_str(&format!("Urgency: {}\n", flags.urgency_level));
        }
        for flag in &flags.red_flags {
            output.push_str(&format!(
                "  {} {} ({}, from {})\n",
                "!".red(),
                flag.flag,
                Self::severity(flag.severity),
                flag.source_specialist
            ));
        }

        for phase in &plan.phases {
            output.push_str(&format!(
                "\n{}\n",
                format!("Phase {}: {} ({})", phase.number, phase.name, phase.timeframe)
                    .yellow()
                    .bold()
            ));
            for goal in &phase.goals {
                output.push_str(&format!("  Goal: {}\n", goal));
            }
            for intervention in &phase.interventions {
                output.push_str(&format!("  * {}\n", intervention));
            }
        }

        let c = &plan.confidence_factors;
        output.push_str(&format!(
            "\n{} overall {:.2} (data {:.2}, agreement {:.2}, evidence {:.2})\n",
            "Confidence:".cyan().bold(),
            c.overall,
            c.data_completeness,
            c.inter_agent_agreement,
            c.evidence_quality
        ));
        if !plan.tracking_metrics.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Tracking:".cyan().bold(),
                plan.tracking_metrics.join(", ")
            ));
        }
        output.push_str(&format!(
            "{} in {} days\n",
            "Next checkpoint:".cyan().bold(),
            plan.next_checkpoint_days
        ));
        for note in &plan.annotations {
            output.push_str(&format!("{} {}\n", "Note:".dimmed(), note));
        }
        output
    }

    fn severity(severity: Severity) -> colored::ColoredString {
        match severity {
            Severity::High => severity.as_str().red(),
            Severity::Moderate => severity.as_str().yellow(),
            Severity::Low => severity.as_str().normal(),
        }
    }

    fn progress_status(status: ProgressStatus) -> colored::ColoredString {
        match status {
            ProgressStatus::OnTrack => status.as_str().green().bold(),
            ProgressStatus::Concerning => status.as_str().yellow().bold(),
            ProgressStatus::NeedsAttention => status.as_str().red().bold(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, response: &ConsultationResponse) -> String {
        Self::format(response)
    }

    fn format_json(&self, response: &ConsultationResponse) -> String {
        Self::format_json(response)
    }

    fn format_plan_only(&self, response: &ConsultationResponse) -> String {
        Self::format_plan_only(response)
    }

    fn format_milestone(&self, report: &MilestoneReport) -> String {
        Self::format_milestone(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{
        Case, ConferenceRecord, KeyFinding, MilestonePolicy, OutputFormat, ProgressUpdate,
        SessionStatus,
        SpecialistDirectory, SpecialistId, milestone::assess, synthesis::synthesize,
    };

    fn completed_session() -> ConsultationSession {
        let case = Case::new("case-7")
            .with_query("knee pain")
            .with_baseline("pain", 8.0);
        let routing = RoutingDecision::fallback(
            &case,
            &SpecialistDirectory::default(),
            &[SpecialistId::new("physio"), SpecialistId::new("sleep")],
            "test",
        );
        let mut session = ConsultationSession::new(case, routing);
        session.record_opinion(
            SpecialistOpinion::success("physio", "musculoskeletal", 0.8)
                .with_key_finding(KeyFinding::new("Patellofemoral pain", Severity::Moderate))
                .with_recommendation("Quadriceps strengthening"),
        );
        session.record_opinion(SpecialistOpinion::timeout(
            SpecialistId::new("sleep"),
            "sleep",
            5000,
        ));
        session.transition(SessionStatus::Dispatched, None).unwrap();
        let conference = ConferenceRecord::default();
        let plan = synthesize(&session, &conference);
        session.attach_conference(conference);
        session.transition(SessionStatus::Conferenced, None).unwrap();
        session.attach_plan(plan);
        session.transition(SessionStatus::Synthesized, None).unwrap();
        session
    }

    #[test]
    fn test_full_format_lists_opinions_and_plan() {
        colored::control::set_override(false);
        let response = ConsultationResponse::from_session(&completed_session());
        let text = ConsoleFormatter.render(&response, OutputFormat::Full);

        assert!(text.contains("Specialist Opinions"));
        assert!(text.contains("Patellofemoral pain (moderate)"));
        assert!(text.contains("timeout: no response within 5000ms"));
        assert!(text.contains("Phase 1: Immediate Stabilization"));
        assert!(text.contains("Missing: sleep (timeout)"));
    }

    #[test]
    fn test_plan_format_is_concise() {
        colored::control::set_override(false);
        let response = ConsultationResponse::from_session(&completed_session());
        let text = ConsoleFormatter.render(&response, OutputFormat::Plan);

        assert!(text.contains("Quadriceps strengthening"));
        assert!(!text.contains("Specialist Opinions"));
    }

    #[test]
    fn test_json_format_parses() {
        let response = ConsultationResponse::from_session(&completed_session());
        let text = ConsoleFormatter.render(&response, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["case_id"], "case-7");
    }

    #[test]
    fn test_milestone_format() {
        colored::control::set_override(false);
        let session = completed_session();
        let update = ProgressUpdate::new(14).with_metric("pain", 5.0).with_adherence(0.9);
        let assessment = assess(
            session.case().baseline_metrics(),
            &update,
            &MilestonePolicy::default(),
        );
        let report = MilestoneReport::new(session.id().clone(), &update, assessment, 14);

        let text = ConsoleFormatter.render_milestone(&report, OutputFormat::Plan);
        assert!(text.contains("Checkpoint: day 14"));
        assert!(text.contains("on_track"));
        assert!(text.contains("Next checkpoint: day 28"));
    }

    #[test]
    fn test_render_through_trait_object() {
        colored::control::set_override(false);
        let formatter: &dyn OutputFormatter = &ConsoleFormatter;
        let response = ConsultationResponse::from_session(&completed_session());

        let plan = formatter.render(&response, OutputFormat::Plan);
        assert!(plan.contains("Council Treatment Plan"));
        let json = formatter.render(&response, OutputFormat::Json);
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }
}
