use axum::{Json, extract::Path, response::IntoResponse};
use kanau::processor::Processor;
use rosterlink_core::entities::registrations::UnregisterUsers;
use rosterlink_core::matching::select_for_cleanup;
use rosterlink_sdk::objects::admin::{CleanupRequest, CleanupResponse};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::matching::compute_match_report;
use super::{AdminApiError, configured_tournament};

/// `POST /tournaments/{id}/cleanup` - unregister the local users a fresh
/// match report puts in the requested category.
pub async fn cleanup(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(tournament_id): Path<String>,
    Json(request): Json<CleanupRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tournament = configured_tournament(&state, &tournament_id).await?;
    let (report, registrants) = compute_match_report(&state, &tournament).await?;

    let selected = select_for_cleanup(&report, &registrants, request.category);
    let unregistered = if selected.is_empty() {
        Vec::new()
    } else {
        state
            .processor()
            .process(UnregisterUsers {
                user_ids: selected.clone(),
            })
            .await
            .map_err(AdminApiError::Database)?
    };

    tracing::info!(
        tournament_id = %tournament.id,
        category = ?request.category,
        selected = selected.len(),
        unregistered = unregistered.len(),
        "Cleanup finished"
    );

    Ok(Json(CleanupResponse {
        category: request.category,
        selected: selected.len(),
        unregistered,
    }))
}
