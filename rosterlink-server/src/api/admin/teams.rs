use axum::{Json, extract::Query, response::IntoResponse};
use kanau::processor::Processor;
use rosterlink_core::entities::teams::ListTeamsWithMembers;
use rosterlink_sdk::objects::admin::ListTeamsQuery;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, team_to_response};

/// `GET /teams` - list persisted teams with their members, optionally
/// filtered by tournament. Active teams only unless `active_only=false`.
pub async fn list_teams(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListTeamsQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let teams = state
        .processor()
        .process(ListTeamsWithMembers {
            tournament_id: query.tournament_id,
            active_only: query.active_only,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let response: Vec<_> = teams.iter().map(team_to_response).collect();
    Ok(Json(response))
}
