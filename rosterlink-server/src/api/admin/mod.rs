//! Admin API handlers.
//!
//! These endpoints are called by organizer tooling and require the
//! `Rosterlink-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `POST   /tournaments/{id}/sync`              - run a roster sync pass now
//! - `GET    /tournaments/{id}/match`             - match participants against registrations
//! - `POST   /tournaments/{id}/cleanup`           - unregister users of a cleanup category
//! - `POST   /tournaments/{id}/removals`          - persist a removal batch of unmatched participants
//! - `POST   /removals/{batch_id}/run`            - run or resume a removal batch
//! - `GET    /teams`                              - list persisted teams with members
//! - `POST   /registrations`                      - register a user
//! - `GET    /registrations/{user_id}`            - show a registration
//! - `DELETE /registrations/{user_id}`            - unregister a user
//! - `GET    /registrations/{user_id}/identity`   - show the claimed identity
//! - `PUT    /registrations/{user_id}/identity`   - replace the claimed identity
//! - `GET    /registrations/{user_id}/team`       - the user's active team
//! - `GET    /registrations/{user_id}/ban`        - ban status
//! - `POST   /registrations/{user_id}/ban`        - ban a user
//! - `POST   /registrations/{user_id}/unban`      - lift a ban

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;

mod cleanup;
mod matching;
mod registrations;
mod removals;
mod sync;
mod teams;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tournaments/{id}/sync", post(sync::sync_tournament))
        .route("/tournaments/{id}/match", get(matching::match_report))
        .route("/tournaments/{id}/cleanup", post(cleanup::cleanup))
        .route(
            "/tournaments/{id}/removals",
            post(removals::create_removal_batch),
        )
        .route(
            "/removals/{batch_id}/run",
            post(removals::run_removal_batch),
        )
        .route("/teams", get(teams::list_teams))
        .route("/registrations", post(registrations::register))
        .route(
            "/registrations/{user_id}",
            get(registrations::get_registration).delete(registrations::unregister),
        )
        .route(
            "/registrations/{user_id}/identity",
            get(registrations::get_claimed_identity).put(registrations::set_claimed_identity),
        )
        .route(
            "/registrations/{user_id}/team",
            get(registrations::user_team),
        )
        .route(
            "/registrations/{user_id}/ban",
            get(registrations::ban_status).post(registrations::ban),
        )
        .route("/registrations/{user_id}/unban", post(registrations::unban))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

use rosterlink_core::config::TournamentConfig;
use rosterlink_core::feed::FeedError;
use rosterlink_core::processors::{RemovalError, SyncError};
use rosterlink_core::roster::StoreError;

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Database(sqlx::Error),
    NotFound,
    /// No `[[tournaments]]` entry with this id.
    TournamentNotConfigured(String),
    SyncInProgress(String),
    SyncFailed(StoreError),
    Feed(FeedError),
    /// The platform listed no participants; nothing is derived from it.
    EmptySnapshot,
    Removal(RemovalError),
}

impl From<SyncError> for AdminApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InProgress(id) => AdminApiError::SyncInProgress(id),
            SyncError::Persistence(e) => AdminApiError::SyncFailed(e),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::NotFound => {
                (StatusCode::NOT_FOUND, "resource not found").into_response()
            }
            AdminApiError::TournamentNotConfigured(id) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("tournament {id:?} is not configured"),
            )
                .into_response(),
            AdminApiError::SyncInProgress(id) => (
                StatusCode::CONFLICT,
                format!("a sync pass for tournament {id:?} is already running"),
            )
                .into_response(),
            AdminApiError::SyncFailed(e) => {
                tracing::error!(error = %e, "Admin API sync pass failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "sync pass failed").into_response()
            }
            AdminApiError::Feed(e) => {
                tracing::warn!(error = %e, "Admin API platform fetch failed");
                (StatusCode::BAD_GATEWAY, "tournament platform unavailable").into_response()
            }
            AdminApiError::EmptySnapshot => (
                StatusCode::SERVICE_UNAVAILABLE,
                "tournament platform returned no participants",
            )
                .into_response(),
            AdminApiError::Removal(RemovalError::InProgress(batch_id)) => (
                StatusCode::CONFLICT,
                format!("removal batch {batch_id} is already running"),
            )
                .into_response(),
            AdminApiError::Removal(e) => {
                tracing::error!(error = %e, "Admin API removal batch failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "removal batch failed").into_response()
            }
        }
    }
}

/// Resolve a tournament id against the current configuration.
pub(crate) async fn configured_tournament(
    state: &AppState,
    tournament_id: &str,
) -> Result<TournamentConfig, AdminApiError> {
    state
        .config
        .tournament(tournament_id)
        .await
        .ok_or_else(|| AdminApiError::TournamentNotConfigured(tournament_id.to_owned()))
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

use rosterlink_core::entities::registrations::{Registrant, Registration};
use rosterlink_core::entities::teams::TeamWithMembers;
use rosterlink_sdk::objects::admin::{
    RegistrantResponse, RegistrationResponse, TeamMemberResponse, TeamResponse,
};

pub(crate) fn registrant_to_response(r: &Registrant) -> RegistrantResponse {
    RegistrantResponse {
        local_id: r.local_id,
        display_name: r.display_name.clone(),
        claimed_identity: r.claimed_identity.clone(),
    }
}

pub(crate) fn registration_to_response(r: &Registration) -> RegistrationResponse {
    RegistrationResponse {
        user_id: r.user_id,
        username: r.username.clone(),
        claimed_identity: r.claimed_identity.clone(),
        banned: r.banned,
        registered_at: r.registered_at.assume_utc().unix_timestamp(),
    }
}

pub(crate) fn team_to_response(t: &TeamWithMembers) -> TeamResponse {
    TeamResponse {
        team_id: t.team.team_id,
        tournament_id: t.team.tournament_id.clone(),
        team_name: t.team.team_name.clone(),
        is_active: t.team.is_active,
        last_synced_at: t.team.last_synced_at.assume_utc().unix_timestamp(),
        members: t
            .members
            .iter()
            .map(|m| TeamMemberResponse {
                member_display_name: m.member_display_name.clone(),
                resolved_user_id: m.resolved_user_id,
                resolved_username: m.resolved_username.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::hash_secret;
    use crate::server::build_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rosterlink_core::config::{
        AdminConfig, ServerConfig, SharedConfig, SignupPolicy, TournamentConfig,
    };
    use rosterlink_core::framework::DatabaseProcessor;
    use rosterlink_core::processors::{
        DEFAULT_REMOVAL_PACING, RemovalBatchRunner, SyncCoordinator,
    };
    use rosterlink_core::roster::PgRosterStore;
    use rosterlink_sdk::client::PlatformClient;
    use rosterlink_sdk::headers::ADMIN_AUTH_HEADER;
    use sqlx::postgres::PgPoolOptions;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "organizer-secret";

    /// State whose pool and platform client are never reached by these tests.
    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://rosterlink@localhost/rosterlink")
            .unwrap();
        let feed = PlatformClient::new("http://127.0.0.1:9".parse().unwrap(), None);
        let mut tournaments = HashMap::new();
        tournaments.insert(
            "spring-open".to_string(),
            TournamentConfig {
                id: "spring-open".to_string(),
                shortlink: "spring".to_string(),
                bounty_id: 146289,
            },
        );
        let config = SharedConfig::new(
            ServerConfig {
                listen: "127.0.0.1:0".parse().unwrap(),
            },
            AdminConfig::new(hash_secret(SECRET).unwrap()),
            SignupPolicy::CLOSED,
            tournaments,
        );
        let coordinator = Arc::new(SyncCoordinator::new(
            feed.clone(),
            PgRosterStore::new(pool.clone()),
        ));
        let removals = Arc::new(RemovalBatchRunner::new(
            feed.clone(),
            DatabaseProcessor::new(pool.clone()),
            DEFAULT_REMOVAL_PACING,
        ));
        AppState::new(pool, config, feed, coordinator, removals)
    }

    fn admin_request(method: &str, uri: &str, secret: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(secret) = secret {
            builder = builder.header(ADMIN_AUTH_HEADER, secret);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = build_router(test_state());
        let response = router
            .oneshot(admin_request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_admin_routes_require_secret() {
        let state = test_state();

        let missing = build_router(state.clone())
            .oneshot(admin_request("GET", "/api/v1/admin/teams", None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = build_router(state)
            .oneshot(admin_request(
                "POST",
                "/api/v1/admin/tournaments/spring-open/sync",
                Some("not-the-secret"),
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unconfigured_tournament_is_unavailable() {
        let state = test_state();

        for (method, action) in [("POST", "sync"), ("GET", "match"), ("POST", "removals")] {
            let response = build_router(state.clone())
                .oneshot(admin_request(
                    method,
                    &format!("/api/v1/admin/tournaments/winter-league/{action}"),
                    Some(SECRET),
                ))
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::SERVICE_UNAVAILABLE,
                "{method} {action}"
            );
        }
    }

    #[test]
    fn test_running_removal_batch_is_a_conflict() {
        use super::AdminApiError;
        use axum::response::IntoResponse;
        use rosterlink_core::processors::RemovalError;

        let batch_id = uuid::Uuid::now_v7();
        let response = AdminApiError::Removal(RemovalError::InProgress(batch_id)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_batch_id_is_rejected() {
        let response = build_router(test_state())
            .oneshot(admin_request(
                "POST",
                "/api/v1/admin/removals/not-a-uuid/run",
                Some(SECRET),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
