//! Output formatter trait

use council_application::ConsultationResponse;
use council_domain::{MilestoneReport, OutputFormat};

/// Trait for formatting consultation results
pub trait OutputFormatter {
    /// Routing, opinions, conference and plan
    fn format(&self, response: &ConsultationResponse) -> String;

    /// Format as JSON
    fn format_json(&self, response: &ConsultationResponse) -> String;

    /// Plan only (concise output)
    fn format_plan_only(&self, response: &ConsultationResponse) -> String;

    /// A milestone checkpoint report
    fn format_milestone(&self, report: &MilestoneReport) -> String;

    /// Render a response in the requested format.
    fn render(&self, response: &ConsultationResponse, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(response),
            OutputFormat::Plan => self.format_plan_only(response),
            OutputFormat::Json => self.format_json(response),
        }
    }

    /// Render a milestone report; the full and plan formats share one layout.
    fn render_milestone(&self, report: &MilestoneReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Full | OutputFormat::Plan => self.format_milestone(report),
        }
    }
}
