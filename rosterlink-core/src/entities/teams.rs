use crate::framework::DatabaseProcessor;
use itertools::Itertools;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Team {
    pub team_id: i32,
    pub tournament_id: String,
    pub team_name: String,
    pub is_active: bool,
    pub last_synced_at: time::PrimitiveDateTime,
}

/// Identity of a persisted team, as returned by the sweep queries.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TeamRef {
    pub team_id: i32,
    pub team_name: String,
}

/// A membership row to insert during a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMembership {
    pub member_display_name: String,
    pub resolved_user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub member_display_name: String,
    pub resolved_user_id: Option<i64>,
    pub resolved_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<TeamMember>,
}

/// One row of the team/member/registration left join.
#[derive(Debug, sqlx::FromRow)]
struct TeamMemberJoinRow {
    team_id: i32,
    tournament_id: String,
    team_name: String,
    is_active: bool,
    last_synced_at: time::PrimitiveDateTime,
    member_display_name: Option<String>,
    resolved_user_id: Option<i64>,
    resolved_username: Option<String>,
}

impl TeamMemberJoinRow {
    fn team(&self) -> Team {
        Team {
            team_id: self.team_id,
            tournament_id: self.tournament_id.clone(),
            team_name: self.team_name.clone(),
            is_active: self.is_active,
            last_synced_at: self.last_synced_at,
        }
    }

    fn into_member(self) -> Option<TeamMember> {
        Some(TeamMember {
            member_display_name: self.member_display_name?,
            resolved_user_id: self.resolved_user_id,
            resolved_username: self.resolved_username,
        })
    }
}

/// Fold joined rows (ordered by team) into teams with their members.
fn group_rows(rows: Vec<TeamMemberJoinRow>) -> Vec<TeamWithMembers> {
    let grouped = rows.into_iter().chunk_by(|row| row.team_id);
    let mut teams = Vec::new();
    for (_, group) in &grouped {
        let mut group = group.peekable();
        let Some(team) = group.peek().map(TeamMemberJoinRow::team) else {
            continue;
        };
        let members = group.filter_map(TeamMemberJoinRow::into_member).collect();
        teams.push(TeamWithMembers { team, members });
    }
    teams
}

impl Team {
    /// Mark phase: flag every team of the tournament inactive.
    pub async fn mark_all_inactive_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tournament_id: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE teams SET is_active = FALSE WHERE tournament_id = $1")
            .bind(tournament_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert a team or reactivate the existing row with the same name.
    /// Returns the team id.
    pub async fn upsert_active_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tournament_id: &str,
        team_name: &str,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO teams (tournament_id, team_name, is_active, last_synced_at)
            VALUES ($1, $2, TRUE, NOW() AT TIME ZONE 'UTC')
            ON CONFLICT (tournament_id, team_name)
            DO UPDATE SET is_active = TRUE, last_synced_at = EXCLUDED.last_synced_at
            RETURNING team_id
            "#,
        )
        .bind(tournament_id)
        .bind(team_name)
        .fetch_one(&mut **tx)
        .await
    }

    /// Replace every membership row of a team.
    pub async fn replace_members_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        team_id: i32,
        members: &[NewMembership],
    ) -> Result<u64, sqlx::Error> {
        sqlx::query("DELETE FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .execute(&mut **tx)
            .await?;

        if members.is_empty() {
            return Ok(0);
        }

        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO team_members (team_id, member_display_name, resolved_user_id) ",
        );
        query_builder.push_values(members, |mut b, member| {
            b.push_bind(team_id)
                .push_bind(&member.member_display_name)
                .push_bind(member.resolved_user_id);
        });

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Teams of a tournament left inactive by the last mark phase.
pub struct ListInactiveTeams {
    pub tournament_id: String,
}

impl Processor<ListInactiveTeams> for DatabaseProcessor {
    type Output = Vec<TeamRef>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListInactiveTeams")]
    async fn process(&self, query: ListInactiveTeams) -> Result<Vec<TeamRef>, sqlx::Error> {
        sqlx::query_as::<_, TeamRef>(
            r#"
            SELECT team_id, team_name
            FROM teams
            WHERE tournament_id = $1 AND is_active = FALSE
            ORDER BY team_name
            "#,
        )
        .bind(query.tournament_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// Delete one team; memberships cascade. Returns whether a row was deleted.
pub struct DeleteTeam {
    pub team_id: i32,
}

impl Processor<DeleteTeam> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteTeam")]
    async fn process(&self, cmd: DeleteTeam) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE team_id = $1")
            .bind(cmd.team_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Default)]
/// List teams with their members and resolved usernames.
pub struct ListTeamsWithMembers {
    pub tournament_id: Option<String>,
    pub active_only: bool,
}

impl Processor<ListTeamsWithMembers> for DatabaseProcessor {
    type Output = Vec<TeamWithMembers>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListTeamsWithMembers")]
    async fn process(
        &self,
        query: ListTeamsWithMembers,
    ) -> Result<Vec<TeamWithMembers>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TeamMemberJoinRow>(
            r#"
            SELECT
                t.team_id,
                t.tournament_id,
                t.team_name,
                t.is_active,
                t.last_synced_at,
                tm.member_display_name,
                tm.resolved_user_id,
                r.username AS resolved_username
            FROM teams t
            LEFT JOIN team_members tm ON tm.team_id = t.team_id
            LEFT JOIN registrations r ON r.user_id = tm.resolved_user_id
            WHERE ($1::TEXT IS NULL OR t.tournament_id = $1)
              AND (NOT $2 OR t.is_active = TRUE)
            ORDER BY t.tournament_id, t.team_name, t.team_id, tm.member_display_name
            "#,
        )
        .bind(query.tournament_id)
        .bind(query.active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rows(rows))
    }
}

#[derive(Debug, Clone, Copy)]
/// The active team a user is resolved on, with members ordered
/// requester-first and then by name.
pub struct GetUserTeam {
    pub user_id: i64,
}

impl Processor<GetUserTeam> for DatabaseProcessor {
    type Output = Option<TeamWithMembers>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserTeam")]
    async fn process(&self, query: GetUserTeam) -> Result<Option<TeamWithMembers>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TeamMemberJoinRow>(
            r#"
            WITH own_team AS (
                SELECT t.team_id
                FROM teams t
                JOIN team_members tm ON tm.team_id = t.team_id
                WHERE tm.resolved_user_id = $1 AND t.is_active = TRUE
                ORDER BY t.last_synced_at DESC
                LIMIT 1
            )
            SELECT
                t.team_id,
                t.tournament_id,
                t.team_name,
                t.is_active,
                t.last_synced_at,
                tm.member_display_name,
                tm.resolved_user_id,
                r.username AS resolved_username
            FROM own_team o
            JOIN teams t ON t.team_id = o.team_id
            LEFT JOIN team_members tm ON tm.team_id = t.team_id
            LEFT JOIN registrations r ON r.user_id = tm.resolved_user_id
            ORDER BY
                CASE WHEN tm.resolved_user_id = $1 THEN 0 ELSE 1 END,
                tm.member_display_name
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rows(rows).into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(team_id: i32, team_name: &str, member: Option<&str>) -> TeamMemberJoinRow {
        TeamMemberJoinRow {
            team_id,
            tournament_id: "spring-open".to_string(),
            team_name: team_name.to_string(),
            is_active: true,
            last_synced_at: time::PrimitiveDateTime::MIN,
            member_display_name: member.map(str::to_string),
            resolved_user_id: None,
            resolved_username: None,
        }
    }

    #[test]
    fn test_group_rows_keeps_memberless_teams() {
        let teams = group_rows(vec![
            row(1, "Blue", Some("Ava")),
            row(1, "Blue", Some("Bo")),
            row(2, "Red", None),
        ]);

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team.team_name, "Blue");
        assert_eq!(
            teams[0]
                .members
                .iter()
                .map(|m| m.member_display_name.as_str())
                .collect::<Vec<_>>(),
            vec!["Ava", "Bo"]
        );
        assert_eq!(teams[1].team.team_name, "Red");
        assert!(teams[1].members.is_empty());
    }
}
