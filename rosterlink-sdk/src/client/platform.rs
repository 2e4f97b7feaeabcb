//! Tournament platform client.
//!
//! Reads full team and participant snapshots from the platform's bounty API
//! and issues participant kicks. Pagination and auth live here so the
//! reconciliation engine only ever sees complete snapshots.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::{ClientError, expect_success, parse_response};
use crate::headers::PLATFORM_AUTH_HEADER;
use crate::objects::feed::{ExternalParticipant, ExternalTeam, ExternalTeamMember};

const PARTICIPANT_PAGE_SIZE: u32 = 500;

/// Display names the platform uses for sign-up placeholders rather than players.
const PLACEHOLDER_NAMES: [&str; 3] = ["do not make a team", "dont make a team", "looking for team"];

/// Returns `true` for display names that denote a placeholder entry.
pub fn is_placeholder_name(display_name: &str) -> bool {
    let lowered = display_name.trim().to_lowercase();
    PLACEHOLDER_NAMES.contains(&lowered.as_str())
}

/// Typed HTTP client for the tournament platform.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl PlatformClient {
    /// Create a new `PlatformClient`.
    ///
    /// * `base_url` - API root of the platform (e.g. `https://api.matcherino.com`).
    /// * `auth_token` - bearer token, only required for kicks.
    pub fn new(base_url: Url, auth_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            auth_token,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /__api/bounties/findById` - every team of the tournament with its members.
    pub async fn fetch_teams(&self, shortlink: &str) -> Result<Vec<ExternalTeam>, ClientError> {
        let url = self.base_url.join("/__api/bounties/findById")?;

        let resp = self
            .http
            .get(url)
            .query(&[("id", "0"), ("shortlink", shortlink)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let envelope: Envelope<BountyBody> = parse_response(resp).await?;
        let teams = envelope
            .body
            .teams
            .ok_or(ClientError::UnexpectedResponse("bounty has no teams field"))?;

        let teams: Vec<ExternalTeam> = teams.into_iter().map(WireTeam::into_external).collect();
        info!(
            shortlink,
            teams = teams.len(),
            members = teams.iter().map(|t| t.members.len()).sum::<usize>(),
            "Fetched team snapshot"
        );
        Ok(teams)
    }

    /// `GET /__api/bounties/participants` - every participant, across all pages.
    ///
    /// Placeholder and nameless entries are dropped. A failure on any page
    /// fails the whole fetch; a partial listing is never returned.
    pub async fn fetch_participants(
        &self,
        bounty_id: i64,
    ) -> Result<Vec<ExternalParticipant>, ClientError> {
        let url = self.base_url.join("/__api/bounties/participants")?;
        let bounty_id = bounty_id.to_string();
        let page_size = PARTICIPANT_PAGE_SIZE.to_string();

        let mut participants = Vec::new();
        let mut page: u32 = 0;
        let mut page_count: Option<u32> = None;

        loop {
            let resp = self
                .http
                .get(url.clone())
                .query(&[
                    ("bountyId", bounty_id.as_str()),
                    ("page", page.to_string().as_str()),
                    ("pageSize", page_size.as_str()),
                ])
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let envelope: Envelope<ParticipantPage> = parse_response(resp).await?;
            let body = envelope.body;
            if page_count.is_none() {
                page_count = body.page_count;
            }

            debug!(
                bounty_id = %bounty_id,
                page,
                entries = body.contents.len(),
                "Fetched participant page"
            );

            let fetched = body.contents.len();
            participants.extend(body.contents.into_iter().filter_map(WireParticipant::into_external));

            page += 1;
            if !has_more_pages(page, page_count, fetched)? {
                break;
            }
        }

        info!(
            bounty_id = %bounty_id,
            participants = participants.len(),
            "Fetched participant snapshot"
        );
        Ok(participants)
    }

    /// `POST /__api/bounties/participants/kick` - remove one participant.
    pub async fn kick_participant(&self, bounty_id: i64, external_id: &str) -> Result<(), ClientError> {
        let token = self.auth_token.as_deref().ok_or(ClientError::MissingAuthToken)?;
        let user_id: i64 = external_id
            .trim()
            .parse()
            .map_err(|_| ClientError::InvalidExternalId(external_id.to_owned()))?;

        let url = self.base_url.join("/__api/bounties/participants/kick")?;
        let body = KickRequest {
            bounty_id,
            user_ids: vec![user_id],
        };

        let resp = self
            .http
            .post(url)
            .header(PLATFORM_AUTH_HEADER, format!("Bearer {token}"))
            .json(&body)
            .send()
            .await?;

        if let Err(e) = expect_success(resp).await {
            warn!(bounty_id, external_id, error = %e, "Kick rejected by platform");
            return Err(e);
        }
        Ok(())
    }
}

/// Decide whether another participant page must be fetched after `fetched`
/// entries arrived on page `page - 1`.
///
/// An empty page before the advertised page count, or a listing without a
/// page count, is an inconsistent snapshot and is rejected.
fn has_more_pages(page: u32, page_count: Option<u32>, fetched: usize) -> Result<bool, ClientError> {
    let total = page_count.ok_or(ClientError::UnexpectedResponse(
        "participant listing has no pageCount",
    ))?;
    if page >= total {
        return Ok(false);
    }
    if fetched == 0 {
        return Err(ClientError::UnexpectedResponse(
            "participant page empty before pageCount was reached",
        ));
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    body: T,
}

#[derive(Debug, Deserialize)]
struct BountyBody {
    teams: Option<Vec<WireTeam>>,
}

#[derive(Debug, Deserialize)]
struct WireTeam {
    #[serde(default)]
    name: String,
    #[serde(default)]
    members: Option<Vec<WireMember>>,
    #[serde(default)]
    team: Option<NestedTeam>,
}

#[derive(Debug, Deserialize)]
struct NestedTeam {
    #[serde(default)]
    members: Vec<WireMember>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMember {
    display_name: Option<String>,
    user_id: Option<WireId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantPage {
    page_count: Option<u32>,
    #[serde(default)]
    contents: Vec<WireParticipant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireParticipant {
    display_name: Option<String>,
    user_id: Option<WireId>,
    #[serde(default)]
    game_username: Option<String>,
}

/// The platform sends account ids as numbers, older payloads as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KickRequest {
    bounty_id: i64,
    user_ids: Vec<i64>,
}

impl WireTeam {
    fn into_external(self) -> ExternalTeam {
        // Direct members win; the nested `team` object is only consulted
        // when the direct list is missing or empty.
        let direct: Vec<ExternalTeamMember> = self
            .members
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireMember::into_external)
            .collect();
        let members = if direct.is_empty() {
            self.team
                .map(|t| t.members.into_iter().filter_map(WireMember::into_external).collect())
                .unwrap_or_default()
        } else {
            direct
        };

        ExternalTeam {
            team_name: self.name.trim().to_owned(),
            members,
        }
    }
}

impl WireMember {
    fn into_external(self) -> Option<ExternalTeamMember> {
        let display_name = self.display_name?.trim().to_owned();
        Some(ExternalTeamMember {
            display_name,
            external_id: self.user_id.map(WireId::into_string),
        })
    }
}

impl WireParticipant {
    fn into_external(self) -> Option<ExternalParticipant> {
        let display_name = self.display_name?.trim().to_owned();
        if display_name.is_empty() || is_placeholder_name(&display_name) {
            return None;
        }
        Some(ExternalParticipant {
            display_name,
            external_id: self.user_id.map(WireId::into_string).unwrap_or_default(),
            secondary_handle: self.game_username.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_members_prefer_direct_list() {
        let json = r#"{
            "body": {
                "teams": [
                    {
                        "name": " Red ",
                        "members": [
                            {"displayName": "Ava ", "userId": 100},
                            {"userId": 7}
                        ],
                        "team": {"members": [{"displayName": "Ignored", "userId": 1}]}
                    },
                    {
                        "name": "Blue",
                        "members": [],
                        "team": {"members": [{"displayName": "Bo", "userId": "2"}]}
                    }
                ]
            }
        }"#;
        let envelope: Envelope<BountyBody> = serde_json::from_str(json).unwrap();
        let teams: Vec<ExternalTeam> = envelope
            .body
            .teams
            .unwrap()
            .into_iter()
            .map(WireTeam::into_external)
            .collect();

        assert_eq!(teams[0].team_name, "Red");
        assert_eq!(teams[0].members, vec![ExternalTeamMember::with_id("Ava", "100")]);
        assert_eq!(teams[1].members, vec![ExternalTeamMember::with_id("Bo", "2")]);
    }

    #[test]
    fn test_participants_drop_placeholders() {
        let json = r##"{
            "body": {
                "pageCount": 1,
                "contents": [
                    {"displayName": "Ava", "userId": 100, "gameUsername": "#ABC"},
                    {"displayName": "Looking For Team", "userId": 5},
                    {"displayName": "   ", "userId": 6},
                    {"userId": 8}
                ]
            }
        }"##;
        let envelope: Envelope<ParticipantPage> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.body.page_count, Some(1));
        let participants: Vec<ExternalParticipant> = envelope
            .body
            .contents
            .into_iter()
            .filter_map(WireParticipant::into_external)
            .collect();
        assert_eq!(participants, vec![ExternalParticipant::new("Ava", "100", "#ABC")]);
    }

    #[test]
    fn test_paging_stops_at_page_count() {
        assert!(has_more_pages(1, Some(3), 500).unwrap());
        assert!(has_more_pages(2, Some(3), 500).unwrap());
        assert!(!has_more_pages(3, Some(3), 12).unwrap());
        // A tournament without participants lists one empty page.
        assert!(!has_more_pages(1, Some(1), 0).unwrap());
        assert!(!has_more_pages(1, Some(0), 0).unwrap());
    }

    #[test]
    fn test_paging_rejects_short_listing() {
        assert!(matches!(
            has_more_pages(2, Some(3), 0),
            Err(ClientError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            has_more_pages(1, None, 500),
            Err(ClientError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder_name("Do Not Make A Team"));
        assert!(is_placeholder_name(" dont make a team "));
        assert!(!is_placeholder_name("Team Player"));
    }

    #[test]
    fn test_kick_request_shape() {
        let body = KickRequest {
            bounty_id: 146289,
            user_ids: vec![42],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"bountyId": 146289, "userIds": [42]}));
    }
}
