//! Data-quality notes.
//!
//! Snapshot entries that cannot be used are skipped, logged at `warn` and
//! reported back to the caller as one of these notes. None of them fail an
//! operation.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityNote {
    /// A participant whose display name is empty after trimming.
    EmptyParticipantName { position: usize, external_id: String },
    /// A participant whose identity was already processed earlier in the snapshot.
    DuplicateParticipant { identity: String },
    /// A team whose name is empty after trimming.
    EmptyTeamName { position: usize },
    /// A team name listed more than once; only the first occurrence is applied.
    DuplicateTeamName { team_name: String },
    /// A team member whose display name is empty after trimming.
    EmptyMemberName { team_name: String },
    /// A member name listed more than once inside one team.
    DuplicateMember { team_name: String, member: String },
    /// A member resolved to a local account already attached to an earlier team.
    LocalIdAlreadyAssigned {
        team_name: String,
        member: String,
        local_id: i64,
        kept_by: String,
    },
}

impl fmt::Display for DataQualityNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyParticipantName {
                position,
                external_id,
            } => write!(
                f,
                "participant #{position} (external id {external_id:?}) has an empty display name"
            ),
            Self::DuplicateParticipant { identity } => {
                write!(f, "participant {identity:?} listed more than once")
            }
            Self::EmptyTeamName { position } => write!(f, "team #{position} has an empty name"),
            Self::DuplicateTeamName { team_name } => {
                write!(f, "team {team_name:?} listed more than once")
            }
            Self::EmptyMemberName { team_name } => {
                write!(f, "team {team_name:?} has a member with an empty name")
            }
            Self::DuplicateMember { team_name, member } => {
                write!(f, "member {member:?} listed more than once in team {team_name:?}")
            }
            Self::LocalIdAlreadyAssigned {
                team_name,
                member,
                local_id,
                kept_by,
            } => write!(
                f,
                "member {member:?} of team {team_name:?} resolves to user {local_id}, \
                 already on team {kept_by:?}; left unresolved"
            ),
        }
    }
}
