use axum::{Json, extract::Path, response::IntoResponse};
use kanau::processor::Processor;
use rosterlink_core::entities::registrations::{
    BanUser, GetClaimedIdentity, GetRegistration, IsUserBanned, RegisterUser, RegistrationOutcome,
    SetClaimedIdentity, UnbanUser, UnregisterUser,
};
use rosterlink_core::entities::teams::GetUserTeam;
use rosterlink_sdk::objects::admin::{
    BanRequest, BanResponse, BanStatusResponse, ClaimedIdentityResponse, RegisterRequest,
    RegisterResponse, RegistrationStatus, SetIdentityRequest, SetIdentityResponse, UnbanResponse,
};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, registration_to_response, team_to_response};

/// `POST /registrations` - register a user under the current signup policy.
///
/// Closed signups and bans are reported in the body, not as HTTP errors.
pub async fn register(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let policy = state.config.signup_policy().await;

    let outcome = state
        .processor()
        .process(RegisterUser {
            user_id: request.user_id,
            username: request.username,
            claimed_identity: request.claimed_identity,
            policy,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let (status, identity_updated) = match outcome {
        RegistrationOutcome::Registered => (RegistrationStatus::Registered, false),
        RegistrationOutcome::AlreadyRegistered { identity_updated } => {
            (RegistrationStatus::AlreadyRegistered, identity_updated)
        }
        RegistrationOutcome::SignupsClosed => (RegistrationStatus::SignupsClosed, false),
        RegistrationOutcome::Banned => (RegistrationStatus::Banned, false),
    };

    Ok(Json(RegisterResponse {
        status,
        identity_updated,
    }))
}

/// `GET /registrations/{user_id}`
pub async fn get_registration(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let registration = state
        .processor()
        .process(GetRegistration { user_id })
        .await
        .map_err(AdminApiError::Database)?
        .ok_or(AdminApiError::NotFound)?;

    Ok(Json(registration_to_response(&registration)))
}

/// `DELETE /registrations/{user_id}` - detach the user from every team
/// membership, then delete the registration. Answers whether one existed.
pub async fn unregister(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let removed = state
        .processor()
        .process(UnregisterUser { user_id })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(removed))
}

/// `GET /registrations/{user_id}/identity`
pub async fn get_claimed_identity(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let claimed_identity = state
        .processor()
        .process(GetClaimedIdentity { user_id })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(ClaimedIdentityResponse { claimed_identity }))
}

/// `PUT /registrations/{user_id}/identity`
pub async fn set_claimed_identity(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
    Json(request): Json<SetIdentityRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let updated = state
        .processor()
        .process(SetClaimedIdentity {
            user_id,
            claimed_identity: request.claimed_identity,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(SetIdentityResponse { updated }))
}

/// `GET /registrations/{user_id}/team` - the active team the user is a
/// resolved member of, or `null`.
pub async fn user_team(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let team = state
        .processor()
        .process(GetUserTeam { user_id })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(team.as_ref().map(team_to_response)))
}

/// `GET /registrations/{user_id}/ban`
pub async fn ban_status(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let banned = state
        .processor()
        .process(IsUserBanned { user_id })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(BanStatusResponse { banned }))
}

/// `POST /registrations/{user_id}/ban` - ban a user, registered or not.
pub async fn ban(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
    Json(request): Json<BanRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let was_registered = state
        .processor()
        .process(BanUser {
            user_id,
            username: request.username,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(BanResponse { was_registered }))
}

/// `POST /registrations/{user_id}/unban`
pub async fn unban(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    let unbanned = state
        .processor()
        .process(UnbanUser { user_id })
        .await
        .map_err(AdminApiError::Database)?;

    tracing::info!(user_id, unbanned, "User unbanned");
    Ok(Json(UnbanResponse { unbanned }))
}
