//! External platform seams.
//!
//! The engine only sees full snapshots through [`ExternalFeed`] and issues
//! kicks through [`ParticipantRemover`]. The HTTP implementation is the
//! SDK's [`PlatformClient`].

use crate::config::TournamentConfig;
use async_trait::async_trait;
use rosterlink_sdk::client::{ClientError, PlatformClient};
use rosterlink_sdk::objects::{ExternalParticipant, ExternalTeam};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("platform client error: {0}")]
    Client(#[from] ClientError),

    /// The platform rejected the call with a 429 or 5xx status.
    #[error("platform unavailable (status {status})")]
    Unavailable { status: u16 },

    /// Non-HTTP backend failure.
    #[error("feed error: {0}")]
    Other(String),
}

impl FeedError {
    fn from_client(error: ClientError) -> Self {
        match &error {
            ClientError::Api { status, .. }
                if status.is_server_error()
                    || *status == reqwest::StatusCode::TOO_MANY_REQUESTS =>
            {
                FeedError::Unavailable {
                    status: status.as_u16(),
                }
            }
            _ => FeedError::Client(error),
        }
    }
}

/// Source of point-in-time tournament snapshots.
#[async_trait]
pub trait ExternalFeed: Send + Sync {
    /// Every participant of the tournament. Never a partial listing.
    async fn fetch_participants(
        &self,
        tournament: &TournamentConfig,
    ) -> Result<Vec<ExternalParticipant>, FeedError>;

    /// Every team of the tournament with its members.
    async fn fetch_teams(&self, tournament: &TournamentConfig)
    -> Result<Vec<ExternalTeam>, FeedError>;
}

/// Removes a participant from the tournament on the platform.
#[async_trait]
pub trait ParticipantRemover: Send + Sync {
    async fn remove_participant(
        &self,
        tournament: &TournamentConfig,
        external_id: &str,
    ) -> Result<(), FeedError>;
}

#[async_trait]
impl ExternalFeed for PlatformClient {
    async fn fetch_participants(
        &self,
        tournament: &TournamentConfig,
    ) -> Result<Vec<ExternalParticipant>, FeedError> {
        PlatformClient::fetch_participants(self, tournament.bounty_id)
            .await
            .map_err(FeedError::from_client)
    }

    async fn fetch_teams(
        &self,
        tournament: &TournamentConfig,
    ) -> Result<Vec<ExternalTeam>, FeedError> {
        PlatformClient::fetch_teams(self, &tournament.shortlink)
            .await
            .map_err(FeedError::from_client)
    }
}

#[async_trait]
impl ParticipantRemover for PlatformClient {
    async fn remove_participant(
        &self,
        tournament: &TournamentConfig,
        external_id: &str,
    ) -> Result<(), FeedError> {
        self.kick_participant(tournament.bounty_id, external_id)
            .await
            .map_err(FeedError::from_client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_classify_as_unavailable() {
        let error = FeedError::from_client(ClientError::Api {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: String::new(),
        });
        assert!(matches!(error, FeedError::Unavailable { status: 502 }));

        let error = FeedError::from_client(ClientError::Api {
            status: reqwest::StatusCode::NOT_FOUND,
            body: String::new(),
        });
        assert!(matches!(error, FeedError::Client(_)));
    }
}
