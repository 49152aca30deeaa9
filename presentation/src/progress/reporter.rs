//! Progress reporting for consultations

use colored::Colorize;
use council_application::{ConsultationProgress, Stage};
use council_domain::{OpinionStatus, SpecialistId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a consultation with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn stage_display_name(stage: Stage) -> &'static str {
        match stage {
            Stage::Triage => "Triage",
            Stage::Dispatch => "Consulting specialists",
            Stage::Conference => "Conference",
            Stage::Synthesis => "Synthesis",
        }
    }

    fn status_mark(specialist: &SpecialistId, status: OpinionStatus) -> String {
        match status {
            OpinionStatus::Success => format!("{} {}", "v".green(), specialist),
            OpinionStatus::Timeout => format!("{} {} (timeout)", "~".yellow(), specialist),
            OpinionStatus::Unavailable => {
                format!("{} {} (unavailable)", "?".yellow(), specialist)
            }
            OpinionStatus::Failed => format!("{} {}", "x".red(), specialist),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsultationProgress for ProgressReporter {
    fn on_stage_start(&self, stage: Stage, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::stage_style());
        pb.set_prefix(Self::stage_display_name(stage));
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.stage_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_specialist_complete(&self, _stage: Stage, specialist: &SpecialistId, status: OpinionStatus) {
        if let Ok(bar) = self.stage_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(Self::status_mark(specialist, status));
            pb.inc(1);
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        if let Ok(mut bar) = self.stage_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!("{} complete", Self::stage_display_name(stage).green()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ConsultationProgress for SimpleProgress {
    fn on_stage_start(&self, stage: Stage, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            ProgressReporter::stage_display_name(stage).bold(),
            total_tasks
        );
    }

    fn on_specialist_complete(&self, _stage: Stage, specialist: &SpecialistId, status: OpinionStatus) {
        eprintln!("  {}", ProgressReporter::status_mark(specialist, status));
    }

    fn on_stage_complete(&self, _stage: Stage) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_handles_stage_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_stage_start(Stage::Dispatch, 2);
        reporter.on_specialist_complete(Stage::Dispatch, &SpecialistId::new("physio"), OpinionStatus::Success);
        reporter.on_specialist_complete(Stage::Dispatch, &SpecialistId::new("sleep"), OpinionStatus::Timeout);
        reporter.on_stage_complete(Stage::Dispatch);

        assert!(reporter.stage_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_completion_without_start_is_ignored() {
        let reporter = ProgressReporter::new();
        reporter.on_specialist_complete(Stage::Triage, &SpecialistId::new("triage"), OpinionStatus::Failed);
        reporter.on_stage_complete(Stage::Triage);
    }

    #[test]
    fn test_status_marks() {
        colored::control::set_override(false);
        let id = SpecialistId::new("sleep");
        assert_eq!(ProgressReporter::status_mark(&id, OpinionStatus::Timeout), "~ sleep (timeout)");
        assert_eq!(ProgressReporter::status_mark(&id, OpinionStatus::Success), "v sleep");
    }
}
