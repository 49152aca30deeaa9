//! Dispatcher: concurrent fan-out/fan-in over specialist ports.
//!
//! Every call runs as its own task with its own deadline. A failing,
//! panicking or slow specialist only ever affects its own opinion. Fan-in
//! ends when every task is done, the session deadline elapses, or the caller
//! cancels, whichever comes first.

use crate::config::ConsultationParams;
use crate::ports::progress::{ConsultationProgress, Stage};
use crate::ports::specialist::{ConsultContext, SpecialistError, SpecialistPort};
use crate::specialist_table::SpecialistTable;
use council_domain::{Case, OpinionStatus, SpecialistId, SpecialistOpinion};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Opinions gathered by one fan-out.
#[derive(Debug)]
pub(super) struct DispatchOutcome {
    /// One opinion per target, in completion order
    pub opinions: Vec<SpecialistOpinion>,
    /// The caller cancelled before fan-in finished
    pub cancelled: bool,
}

/// Consult one specialist under `context.deadline`.
///
/// Never fails: errors, timeouts and panics become opinions with the
/// matching status and no findings.
pub(super) async fn consult_one(
    specialist: Arc<dyn SpecialistPort>,
    case: Arc<Case>,
    context: ConsultContext,
) -> SpecialistOpinion {
    let id = specialist.id().clone();
    let domain = specialist.profile().domain.clone();
    let deadline = context.deadline;
    let started = Instant::now();

    let call = AssertUnwindSafe(specialist.consult(&case, &context)).catch_unwind();
    let result = tokio::time::timeout(deadline, call).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let opinion = match result {
        Ok(Ok(Ok(mut opinion))) => {
            if opinion.specialist_id != id {
                warn!(specialist = %id, reported = %opinion.specialist_id, "opinion carried a foreign id");
                opinion.specialist_id = id.clone();
            }
            opinion.clamp_confidences();
            opinion.latency_ms = latency_ms;
            opinion
        }
        Ok(Ok(Err(SpecialistError::Timeout(after)))) => {
            SpecialistOpinion::timeout(id.clone(), domain, after.as_millis() as u64)
        }
        Ok(Ok(Err(SpecialistError::Unavailable(reason)))) => SpecialistOpinion::unsuccessful(
            id.clone(),
            domain,
            OpinionStatus::Unavailable,
            reason,
        ),
        Ok(Ok(Err(SpecialistError::Failed(reason)))) => {
            let mut opinion = SpecialistOpinion::failed(id.clone(), domain, reason);
            opinion.latency_ms = latency_ms;
            opinion
        }
        Ok(Err(_panic)) => SpecialistOpinion::failed(id.clone(), domain, "specialist panicked"),
        Err(_elapsed) => SpecialistOpinion::timeout(id.clone(), domain, deadline.as_millis() as u64),
    };

    debug!(
        specialist = %id,
        status = %opinion.status,
        latency_ms,
        "specialist call finished"
    );
    opinion
}

/// Fan out to `targets` and collect exactly one opinion per target.
pub(super) async fn dispatch(
    table: &SpecialistTable,
    case: Arc<Case>,
    targets: &[SpecialistId],
    context: ConsultContext,
    params: &ConsultationParams,
    cancellation: Option<&CancellationToken>,
    progress: &dyn ConsultationProgress,
) -> DispatchOutcome {
    info!(case_id = %case.id(), specialists = targets.len(), "dispatching");
    progress.on_stage_start(Stage::Dispatch, targets.len());

    let mut opinions = Vec::with_capacity(targets.len());
    let mut pending: BTreeMap<SpecialistId, String> = BTreeMap::new();
    let mut join_set = JoinSet::new();

    for id in targets {
        let Some(specialist) = table.get(id) else {
            warn!(specialist = %id, "not registered");
            let opinion = SpecialistOpinion::unavailable(id.clone());
            progress.on_specialist_complete(Stage::Dispatch, id, opinion.status);
            opinions.push(opinion);
            continue;
        };
        pending.insert(id.clone(), specialist.profile().domain.clone());

        let specialist = Arc::clone(specialist);
        let case = Arc::clone(&case);
        let context = context.clone();
        join_set.spawn(consult_one(specialist, case, context));
    }

    let deadline = tokio::time::sleep(params.session_deadline);
    tokio::pin!(deadline);
    let mut cancelled = false;
    let mut deadline_hit = false;

    loop {
        let result = tokio::select! {
            biased;
            _ = wait_cancelled(cancellation) => {
                join_set.abort_all();
                cancelled = true;
                break;
            }
            _ = &mut deadline => {
                join_set.abort_all();
                deadline_hit = true;
                break;
            }
            result = join_set.join_next() => result,
        };

        let Some(result) = result else {
            break;
        };

        match result {
            Ok(opinion) => {
                if pending.remove(&opinion.specialist_id).is_none() {
                    // Late duplicate; the first opinion stands
                    continue;
                }
                progress.on_specialist_complete(
                    Stage::Dispatch,
                    &opinion.specialist_id,
                    opinion.status,
                );
                opinions.push(opinion);
            }
            Err(e) => {
                warn!("Task join error: {}", e);
            }
        }
    }

    // Anything still outstanding is abandoned
    for (id, domain) in pending {
        let opinion = if cancelled {
            SpecialistOpinion::failed(id.clone(), domain, "cancelled")
        } else {
            SpecialistOpinion::timeout(id.clone(), domain, millis(params.session_deadline))
        };
        progress.on_specialist_complete(Stage::Dispatch, &id, opinion.status);
        opinions.push(opinion);
    }

    if deadline_hit {
        warn!(
            case_id = %case.id(),
            deadline_ms = millis(params.session_deadline),
            "session deadline elapsed with specialists outstanding"
        );
    }
    progress.on_stage_complete(Stage::Dispatch);

    DispatchOutcome {
        opinions,
        cancelled,
    }
}

/// Resolves when `token` is cancelled; never resolves without a token.
pub(super) async fn wait_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending::<()>().await,
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}
