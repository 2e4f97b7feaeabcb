//! Admin API client (operator tooling → rosterlink server).
//!
//! All requests carry the plaintext admin secret in the
//! `Rosterlink-Admin-Authorization` header.

use reqwest::Client;
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::headers::ADMIN_AUTH_HEADER;
use crate::objects::admin::{
    BanRequest, BanResponse, BanStatusResponse, ClaimedIdentityResponse, CleanupCategory,
    CleanupRequest, CleanupResponse, ListTeamsQuery, MatchReportResponse, RegisterRequest,
    RegisterResponse, RegistrationResponse, RemovalBatchResponse, RemovalRunResponse,
    SetIdentityRequest, SetIdentityResponse, SyncResponse, TeamResponse, UnbanResponse,
};

/// Typed HTTP client for the rosterlink **Admin API**.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: Client,
    base_url: Url,
    admin_secret: String,
}

impl AdminClient {
    /// Create a new `AdminClient`.
    ///
    /// * `base_url` - root URL of the rosterlink server.
    /// * `admin_secret` - the plaintext admin secret.
    pub fn new(base_url: Url, admin_secret: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            admin_secret: admin_secret.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn tournament_url(&self, tournament_id: &str, action: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!(
            "/api/v1/admin/tournaments/{}/{action}",
            urlencoding::encode(tournament_id)
        ))?)
    }

    /// `POST /api/v1/admin/tournaments/{id}/sync` - run a roster sync pass now.
    pub async fn sync_tournament(&self, tournament_id: &str) -> Result<SyncResponse, ClientError> {
        let url = self.tournament_url(tournament_id, "sync")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/tournaments/{id}/match` - match the current
    /// participant snapshot against the registration ledger.
    pub async fn match_report(
        &self,
        tournament_id: &str,
    ) -> Result<MatchReportResponse, ClientError> {
        let url = self.tournament_url(tournament_id, "match")?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/tournaments/{id}/cleanup` - unregister the users
    /// selected by `category`.
    pub async fn cleanup(
        &self,
        tournament_id: &str,
        category: CleanupCategory,
    ) -> Result<CleanupResponse, ClientError> {
        let url = self.tournament_url(tournament_id, "cleanup")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&CleanupRequest { category })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/tournaments/{id}/removals` - persist a removal
    /// batch for every unmatched participant.
    pub async fn create_removal_batch(
        &self,
        tournament_id: &str,
    ) -> Result<RemovalBatchResponse, ClientError> {
        let url = self.tournament_url(tournament_id, "removals")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/removals/{batch_id}/run` - run or resume a batch.
    pub async fn run_removal_batch(
        &self,
        batch_id: Uuid,
    ) -> Result<RemovalRunResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/removals/{batch_id}/run"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/teams` - list persisted teams with members.
    pub async fn list_teams(&self, query: &ListTeamsQuery) -> Result<Vec<TeamResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/admin/teams")?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .query(query)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/registrations` - register a user.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        let url = self.base_url.join("/api/v1/admin/registrations")?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(request)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `DELETE /api/v1/admin/registrations/{user_id}` - unregister a user.
    /// Returns whether a registration existed.
    pub async fn unregister(&self, user_id: i64) -> Result<bool, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/registrations/{user_id}"))?;

        let resp = self
            .http
            .delete(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/registrations/{user_id}/ban`
    pub async fn ban(&self, user_id: i64, username: &str) -> Result<BanResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/registrations/{user_id}/ban"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&BanRequest {
                username: username.to_owned(),
            })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `POST /api/v1/admin/registrations/{user_id}/unban`
    pub async fn unban(&self, user_id: i64) -> Result<UnbanResponse, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/admin/registrations/{user_id}/unban"))?;

        let resp = self
            .http
            .post(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    fn registration_url(&self, user_id: i64, action: Option<&str>) -> Result<Url, ClientError> {
        let path = match action {
            Some(action) => format!("/api/v1/admin/registrations/{user_id}/{action}"),
            None => format!("/api/v1/admin/registrations/{user_id}"),
        };
        Ok(self.base_url.join(&path)?)
    }

    /// `GET /api/v1/admin/registrations/{user_id}`
    pub async fn registration(&self, user_id: i64) -> Result<RegistrationResponse, ClientError> {
        let url = self.registration_url(user_id, None)?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/registrations/{user_id}/identity`
    pub async fn claimed_identity(
        &self,
        user_id: i64,
    ) -> Result<ClaimedIdentityResponse, ClientError> {
        let url = self.registration_url(user_id, Some("identity"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `PUT /api/v1/admin/registrations/{user_id}/identity`
    pub async fn set_claimed_identity(
        &self,
        user_id: i64,
        claimed_identity: &str,
    ) -> Result<SetIdentityResponse, ClientError> {
        let url = self.registration_url(user_id, Some("identity"))?;

        let resp = self
            .http
            .put(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .json(&SetIdentityRequest {
                claimed_identity: claimed_identity.to_owned(),
            })
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/registrations/{user_id}/ban`
    pub async fn ban_status(&self, user_id: i64) -> Result<BanStatusResponse, ClientError> {
        let url = self.registration_url(user_id, Some("ban"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /api/v1/admin/registrations/{user_id}/team` - the active team
    /// containing the user, members ordered requester-first.
    pub async fn user_team(&self, user_id: i64) -> Result<Option<TeamResponse>, ClientError> {
        let url = self.registration_url(user_id, Some("team"))?;

        let resp = self
            .http
            .get(url)
            .header(ADMIN_AUTH_HEADER, &self.admin_secret)
            .send()
            .await?;

        parse_response(resp).await
    }
}
