//! CLI entrypoint for case-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use council_application::{
    ConsultationOutcome, ConsultationResponse, EvaluateMilestoneInput, EvaluateMilestoneUseCase,
    NoRewards, RewardSink, RunConsultationInput, RunConsultationUseCase, SessionRepository,
};
use council_domain::{Case, IssueSeverity, ProgressUpdate, SessionId};
use council_infrastructure::{
    ConfigLoader, FileConfig, FileSessionStore, InMemoryConsultationCache, InMemorySessionStore,
    JsonlRewardSink, build_specialist_table,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_dir.as_deref());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; the returned guard flushes the log file on drop.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "case-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command else {
        bail!("No command given. Try `case-council consult <CASE.json>` or `case-council --help`.");
    };

    // === Dependency Injection ===
    let table = Arc::new(build_specialist_table(&config)?);
    let cache = Arc::new(InMemoryConsultationCache::new());
    let repository: Arc<dyn SessionRepository> = match &config.store.session_dir {
        Some(dir) => Arc::new(
            FileSessionStore::open(dir)
                .await
                .with_context(|| format!("opening session store {}", dir.display()))?,
        ),
        None => Arc::new(InMemorySessionStore::new()),
    };
    let rewards: Arc<dyn RewardSink> = match config
        .logging
        .outcomes_file
        .as_ref()
        .and_then(JsonlRewardSink::new)
    {
        Some(sink) => Arc::new(sink),
        None => Arc::new(NoRewards),
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling consultation");
            ctrl_c.cancel();
        }
    });

    let consultation = RunConsultationUseCase::new(table, cache, Arc::clone(&repository))
        .with_params(config.consultation.to_params())
        .with_rewards(Arc::clone(&rewards))
        .with_cancellation(cancel);

    let show_progress = !cli.quiet && config.output.show_progress;
    let formatter: &dyn OutputFormatter = &ConsoleFormatter;

    match command {
        Command::Consult { case, mode, output } => {
            let format = output.map(Into::into).or(config.output.format).unwrap_or_default();
            let case: Case = read_json(&case)?;
            info!(case_id = %case.id(), mode = ?mode, "starting consultation");

            let input = RunConsultationInput::new(case.clone()).with_mode(mode.into());
            let result = if show_progress && std::io::stderr().is_terminal() {
                consultation
                    .execute_with_progress(input, &ProgressReporter::new())
                    .await
            } else if show_progress {
                consultation.execute_with_progress(input, &SimpleProgress).await
            } else {
                consultation.execute(input).await
            };

            let response = ConsultationResponse::from_result(case.id(), &result);
            println!("{}", formatter.render(&response, format));

            // The process owns the background work: wait so the session is completed and stored.
            if let Ok(ConsultationOutcome::Partial { completion, .. }) = result {
                if !cli.quiet {
                    eprintln!("Waiting for the remaining specialists...");
                }
                let completed = completion.wait().await;
                let response = match &completed {
                    Ok(session) => ConsultationResponse::from_session(session),
                    Err(e) => ConsultationResponse::from_error(case.id(), e),
                };
                println!("{}", formatter.render(&response, format));
                return Ok(exit_code(&response));
            }

            Ok(exit_code(&response))
        }

        Command::Milestone {
            session_id,
            progress,
            output,
        } => {
            let format = output.map(Into::into).or(config.output.format).unwrap_or_default();
            let update: ProgressUpdate = read_json(&progress)?;

            let use_case = EvaluateMilestoneUseCase::new(repository, consultation)
                .with_policy(config.milestone.to_policy())
                .with_rewards(rewards);
            let report = use_case
                .execute(EvaluateMilestoneInput::new(SessionId::new(session_id), update))
                .await?;

            if let Some(follow_up) = &report.follow_up_session {
                info!(follow_up = %follow_up, "follow-on consultation stored");
            }
            println!("{}", formatter.render_milestone(&report, format));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    let mut errors = Vec::new();
    for issue in config.validate() {
        match issue.severity {
            IssueSeverity::Warning => warn!("config: {}", issue.message),
            IssueSeverity::Error => errors.push(issue.message),
        }
    }
    if !errors.is_empty() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn exit_code(response: &ConsultationResponse) -> ExitCode {
    if response.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
