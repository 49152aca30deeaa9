//! Router: consult triage, then classify urgency and pick specialists.
//!
//! Triage failure is recovered here with the static default routing and
//! never surfaces as an error.

use super::dispatch::consult_one;
use crate::ports::progress::{ConsultationProgress, Stage};
use crate::ports::specialist::ConsultContext;
use crate::specialist_table::SpecialistTable;
use council_domain::{Case, RoutingDecision, SpecialistOpinion};
use std::sync::Arc;
use tracing::{info, warn};

/// Routing decision plus the triage opinion it was derived from.
#[derive(Debug)]
pub(super) struct Routed {
    pub decision: RoutingDecision,
    pub triage: SpecialistOpinion,
}

pub(super) async fn route(
    table: &SpecialistTable,
    case: Arc<Case>,
    context: ConsultContext,
    progress: &dyn ConsultationProgress,
) -> Routed {
    progress.on_stage_start(Stage::Triage, 1);
    let triage = consult_one(Arc::clone(table.triage()), Arc::clone(&case), context).await;
    progress.on_specialist_complete(Stage::Triage, &triage.specialist_id, triage.status);

    let decision = if triage.is_success() {
        RoutingDecision::from_triage(
            &case,
            &triage,
            table.directory(),
            table.triage_id(),
            table.defaults(),
        )
    } else {
        let reason = triage
            .error
            .clone()
            .unwrap_or_else(|| triage.status.to_string());
        warn!(case_id = %case.id(), %reason, "triage failed, using default routing");
        RoutingDecision::fallback(&case, table.directory(), table.defaults(), &reason)
    };

    info!(
        case_id = %case.id(),
        urgency = %decision.urgency,
        selected = decision.selected_specialists.len(),
        completeness = decision.data_completeness,
        "routed"
    );
    progress.on_stage_complete(Stage::Triage);

    Routed { decision, triage }
}
