use axum::{Json, extract::Path, response::IntoResponse};
use kanau::processor::Processor;
use rosterlink_core::entities::removal_items::{CreateRemovalBatch, GetRemovalBatchTournament};
use rosterlink_core::processors::removal_targets;
use rosterlink_sdk::objects::admin::{RemovalBatchResponse, RemovalRunResponse};
use uuid::Uuid;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::matching::compute_match_report;
use super::{AdminApiError, configured_tournament};

/// `POST /tournaments/{id}/removals` - persist a batch that kicks every
/// unmatched participant. Nothing is sent to the platform until the batch
/// is run.
pub async fn create_removal_batch(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(tournament_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tournament = configured_tournament(&state, &tournament_id).await?;
    let (report, _) = compute_match_report(&state, &tournament).await?;

    let batch_id = Uuid::now_v7();
    let items = state
        .processor()
        .process(CreateRemovalBatch {
            batch_id,
            tournament_id: tournament.id.clone(),
            targets: removal_targets(&report),
        })
        .await
        .map_err(AdminApiError::Database)?;

    tracing::info!(%batch_id, tournament_id = %tournament.id, items, "Removal batch created");

    Ok(Json(RemovalBatchResponse {
        batch_id,
        tournament_id: tournament.id,
        items,
    }))
}

/// `POST /removals/{batch_id}/run` - run or resume a batch. Items that
/// already succeeded are never sent again.
pub async fn run_removal_batch(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tournament_id = state
        .processor()
        .process(GetRemovalBatchTournament { batch_id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound)?;
    let tournament = configured_tournament(&state, &tournament_id).await?;

    let summary = state
        .removals
        .run(batch_id, &tournament)
        .await
        .map_err(AdminApiError::Removal)?;

    Ok(Json(RemovalRunResponse {
        attempted: summary.attempted,
        succeeded: summary.succeeded,
        failed: summary.failed,
        remaining: summary.remaining,
    }))
}
