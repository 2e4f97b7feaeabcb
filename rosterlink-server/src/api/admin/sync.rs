use axum::{Json, extract::Path, response::IntoResponse};
use rosterlink_core::processors::{SyncOutcome, SyncTrigger};
use rosterlink_sdk::objects::admin::{SweepFailureResponse, SyncResponse, SyncStatus};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, configured_tournament};

/// `POST /tournaments/{id}/sync` - run a roster sync pass now.
///
/// Shares the in-progress guard with the scheduler, so a pass already
/// running for the tournament answers 409.
pub async fn sync_tournament(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(tournament_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tournament = configured_tournament(&state, &tournament_id).await?;

    let outcome = state
        .coordinator
        .run_pass(&tournament, SyncTrigger::OnDemand)
        .await?;

    let response = match outcome {
        SyncOutcome::Completed(report) => SyncResponse {
            tournament_id,
            status: SyncStatus::Completed,
            updated_team_count: report.updated_team_count,
            removed_teams: report.removed_teams,
            sweep_failures: report
                .sweep_failures
                .into_iter()
                .map(|f| SweepFailureResponse {
                    team_name: f.team_name,
                    error: f.error,
                })
                .collect(),
            resolved_members: report.resolved_members,
            total_members: report.total_members,
            skipped_reason: None,
            notes: report.notes.iter().map(ToString::to_string).collect(),
        },
        SyncOutcome::Skipped(reason) => SyncResponse {
            tournament_id,
            status: SyncStatus::Skipped,
            updated_team_count: 0,
            removed_teams: Vec::new(),
            sweep_failures: Vec::new(),
            resolved_members: 0,
            total_members: 0,
            skipped_reason: Some(reason.to_string()),
            notes: Vec::new(),
        },
    };
    Ok(Json(response))
}
