use axum::{Json, extract::Path, response::IntoResponse};
use kanau::processor::Processor;
use rosterlink_core::config::TournamentConfig;
use rosterlink_core::entities::registrations::{ListRegistrants, Registrant};
use rosterlink_core::feed::ExternalFeed;
use rosterlink_core::matching::{MatchReport, MatchedPair, match_participants};
use rosterlink_sdk::objects::admin::{
    AmbiguousMatchResponse, MatchReportResponse, MatchSummaryResponse, MatchedPairResponse,
};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, configured_tournament, registrant_to_response};

/// Fetch the participant snapshot and match it against the current
/// registrants. Returns the registrants alongside the report since cleanup
/// selection needs both.
pub(crate) async fn compute_match_report(
    state: &AppState,
    tournament: &TournamentConfig,
) -> Result<(MatchReport, Vec<Registrant>), AdminApiError> {
    let participants = ExternalFeed::fetch_participants(&state.feed, tournament)
        .await
        .map_err(AdminApiError::Feed)?;
    if participants.is_empty() {
        return Err(AdminApiError::EmptySnapshot);
    }

    let registrants = state
        .processor()
        .process(ListRegistrants)
        .await
        .map_err(AdminApiError::Database)?;

    let report = match_participants(&participants, &registrants);
    Ok((report, registrants))
}

/// `GET /tournaments/{id}/match` - categorized match report.
pub async fn match_report(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(tournament_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let tournament = configured_tournament(&state, &tournament_id).await?;
    let (report, _) = compute_match_report(&state, &tournament).await?;
    Ok(Json(report_to_response(tournament_id, &report)))
}

fn pair_to_response(pair: &MatchedPair) -> MatchedPairResponse {
    MatchedPairResponse {
        participant: pair.participant.clone(),
        registrant: registrant_to_response(&pair.registrant),
    }
}

fn report_to_response(tournament_id: String, report: &MatchReport) -> MatchReportResponse {
    let summary = report.summary();
    MatchReportResponse {
        tournament_id,
        summary: MatchSummaryResponse {
            participants: summary.participants,
            exact: summary.exact,
            name_only: summary.name_only,
            ambiguous: summary.ambiguous,
            unmatched_external: summary.unmatched_external,
            unmatched_internal: summary.unmatched_internal,
            total_matched: summary.total_matched,
        },
        exact: report.exact.iter().map(pair_to_response).collect(),
        name_only: report.name_only.iter().map(pair_to_response).collect(),
        ambiguous: report
            .ambiguous
            .iter()
            .map(|m| AmbiguousMatchResponse {
                participant: m.participant.clone(),
                candidates: m.candidates.iter().map(registrant_to_response).collect(),
            })
            .collect(),
        unmatched_external: report.unmatched_external.clone(),
        unmatched_internal: report
            .unmatched_internal
            .iter()
            .map(registrant_to_response)
            .collect(),
        notes: report.notes.iter().map(ToString::to_string).collect(),
    }
}
