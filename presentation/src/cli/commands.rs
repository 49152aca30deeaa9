//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use council_application::ConsultationMode;
use std::path::PathBuf;

/// Output format for consultation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Routing, every opinion, the conference and the plan
    Full,
    /// Only the synthesized plan
    #[value(alias = "synthesis")]
    Plan,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Plan => council_domain::OutputFormat::Plan,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// Consultation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Return after triage; specialists finish in the background
    Fast,
    /// Wait for every specialist, the conference and the plan
    Normal,
}

impl From<ModeArg> for ConsultationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Fast => ConsultationMode::Fast,
            ModeArg::Normal => ConsultationMode::Normal,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Consult the specialist council on a case
    Consult {
        /// Case file (JSON)
        #[arg(value_name = "CASE.json")]
        case: PathBuf,

        /// Consultation mode
        #[arg(short, long, value_enum, default_value = "normal")]
        mode: ModeArg,

        /// Output format (defaults to the configured format, else plan)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Evaluate a progress checkpoint against a stored consultation
    Milestone {
        /// Session id printed by `consult`
        #[arg(value_name = "SESSION_ID")]
        session_id: String,

        /// Progress update file (JSON)
        #[arg(value_name = "PROGRESS.json")]
        progress: PathBuf,

        /// Output format (defaults to the configured format, else plan)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },
}

/// CLI arguments for case-council
#[derive(Parser, Debug)]
#[command(name = "case-council")]
#[command(author, version, about = "Specialist council - route a case, consult specialists, synthesize a plan")]
#[command(long_about = r#"
case-council runs a council of specialists over a clinical case.

A consultation has four stages:
1. Triage: a triage specialist classifies urgency and selects specialists
2. Dispatch: selected specialists are consulted in parallel under a deadline
3. Conference: questions are answered, disagreements and cross-domain findings surface
4. Synthesis: a three-phase plan with red flags and confidence factors

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>       Explicit config file
3. ./council.toml        Project-level config
4. ~/.config/case-council/config.toml   Global config

Example:
  case-council consult case.json
  case-council consult case.json --mode fast --output json
  case-council milestone <SESSION_ID> day14.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write a daily-rolling log file into this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consult_args() {
        let cli = Cli::parse_from([
            "case-council",
            "-vv",
            "consult",
            "case.json",
            "--mode",
            "fast",
            "--output",
            "synthesis",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Consult { case, mode, output }) => {
                assert_eq!(case, PathBuf::from("case.json"));
                assert_eq!(mode, ModeArg::Fast);
                assert_eq!(output, Some(OutputFormat::Plan));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_milestone_args() {
        let cli = Cli::parse_from([
            "case-council",
            "milestone",
            "s-1",
            "day14.json",
            "--no-config",
        ]);
        assert!(cli.no_config);
        assert!(matches!(
            cli.command,
            Some(Command::Milestone { ref session_id, output: None, .. }) if session_id == "s-1"
        ));
    }

    #[test]
    fn test_show_config_without_command() {
        let cli = Cli::parse_from(["case-council", "--show-config"]);
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
