use crate::config::SignupPolicy;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Registration {
    pub user_id: i64,
    pub username: String,
    pub claimed_identity: Option<String>,
    pub banned: bool,
    pub registered_at: time::PrimitiveDateTime,
}

/// A registered user eligible for identity matching: not banned, with a
/// non-blank claimed identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Registrant {
    pub local_id: i64,
    pub display_name: String,
    /// Self-declared platform identity, `Name#ExternalId`.
    pub claimed_identity: String,
}

impl Registrant {
    pub fn new(
        local_id: i64,
        display_name: impl Into<String>,
        claimed_identity: impl Into<String>,
    ) -> Self {
        Self {
            local_id,
            display_name: display_name.into(),
            claimed_identity: claimed_identity.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    /// The user was already registered; `identity_updated` tells whether the
    /// supplied claimed identity replaced the stored one.
    AlreadyRegistered { identity_updated: bool },
    SignupsClosed,
    Banned,
}

/// Registrants ordered by registration time, so that later registrations
/// overwrite earlier ones in the matcher's exact index.
pub(crate) async fn list_registrants<'e, E>(executor: E) -> Result<Vec<Registrant>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, Registrant>(
        r#"
        SELECT
            user_id AS local_id,
            username AS display_name,
            btrim(claimed_identity) AS claimed_identity
        FROM registrations
        WHERE banned = FALSE
          AND claimed_identity IS NOT NULL
          AND btrim(claimed_identity) <> ''
        ORDER BY registered_at ASC, user_id ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Detach a user from every team membership they were resolved to.
async fn detach_memberships_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE team_members SET resolved_user_id = NULL WHERE resolved_user_id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
    Ok(result.rows_affected())
}

#[derive(Debug, Clone, Copy)]
/// List every registrant eligible for matching.
pub struct ListRegistrants;

impl Processor<ListRegistrants> for DatabaseProcessor {
    type Output = Vec<Registrant>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRegistrants")]
    async fn process(&self, _query: ListRegistrants) -> Result<Vec<Registrant>, sqlx::Error> {
        list_registrants(&self.pool).await
    }
}

#[derive(Debug, Clone)]
/// Fetch one registration row.
pub struct GetRegistration {
    pub user_id: i64,
}

impl Processor<GetRegistration> for DatabaseProcessor {
    type Output = Option<Registration>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetRegistration")]
    async fn process(&self, query: GetRegistration) -> Result<Option<Registration>, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            r#"
            SELECT user_id, username, claimed_identity, banned, registered_at
            FROM registrations
            WHERE user_id = $1
            "#,
        )
        .bind(query.user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Register a user.
///
/// Order of checks: banned, already registered (the claimed identity is
/// replaced when one is supplied), signups closed, insert.
pub struct RegisterUser {
    pub user_id: i64,
    pub username: String,
    pub claimed_identity: Option<String>,
    pub policy: SignupPolicy,
}

impl Processor<RegisterUser> for DatabaseProcessor {
    type Output = RegistrationOutcome;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RegisterUser")]
    async fn process(&self, cmd: RegisterUser) -> Result<RegistrationOutcome, sqlx::Error> {
        let RegisterUser {
            user_id,
            username,
            claimed_identity,
            policy,
        } = cmd;
        let claimed_identity = claimed_identity
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        let mut tx = self.pool.begin().await?;

        let existing: Option<bool> =
            sqlx::query_scalar("SELECT banned FROM registrations WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let outcome = match existing {
            Some(true) => RegistrationOutcome::Banned,
            Some(false) => {
                let identity_updated = match &claimed_identity {
                    Some(identity) => {
                        sqlx::query("UPDATE registrations SET claimed_identity = $1 WHERE user_id = $2")
                            .bind(identity)
                            .bind(user_id)
                            .execute(&mut *tx)
                            .await?;
                        true
                    }
                    None => false,
                };
                RegistrationOutcome::AlreadyRegistered { identity_updated }
            }
            None if !policy.open => RegistrationOutcome::SignupsClosed,
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO registrations (user_id, username, claimed_identity)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id) DO NOTHING
                    "#,
                )
                .bind(user_id)
                .bind(&username)
                .bind(&claimed_identity)
                .execute(&mut *tx)
                .await?;
                RegistrationOutcome::Registered
            }
        };

        tx.commit().await?;
        tracing::info!(user_id, %username, ?outcome, "Processed registration");
        Ok(outcome)
    }
}

#[derive(Debug, Clone)]
/// Replace a registered user's claimed identity. Returns `false` when the
/// user is not registered.
pub struct SetClaimedIdentity {
    pub user_id: i64,
    pub claimed_identity: String,
}

impl Processor<SetClaimedIdentity> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:SetClaimedIdentity")]
    async fn process(&self, cmd: SetClaimedIdentity) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE registrations SET claimed_identity = $1 WHERE user_id = $2")
            .bind(cmd.claimed_identity.trim())
            .bind(cmd.user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
/// Look up a user's claimed identity.
pub struct GetClaimedIdentity {
    pub user_id: i64,
}

impl Processor<GetClaimedIdentity> for DatabaseProcessor {
    type Output = Option<String>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetClaimedIdentity")]
    async fn process(&self, query: GetClaimedIdentity) -> Result<Option<String>, sqlx::Error> {
        let identity: Option<Option<String>> =
            sqlx::query_scalar("SELECT claimed_identity FROM registrations WHERE user_id = $1")
                .bind(query.user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(identity.flatten())
    }
}

#[derive(Debug, Clone)]
/// Remove a registration. Team memberships resolved to the user are
/// detached first. Returns whether a registration existed.
pub struct UnregisterUser {
    pub user_id: i64,
}

impl UnregisterUser {
    pub async fn execute_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<bool, sqlx::Error> {
        detach_memberships_tx(tx, self.user_id).await?;
        let result = sqlx::query("DELETE FROM registrations WHERE user_id = $1")
            .bind(self.user_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Processor<UnregisterUser> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UnregisterUser")]
    async fn process(&self, cmd: UnregisterUser) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let existed = cmd.execute_tx(&mut tx).await?;
        tx.commit().await?;
        Ok(existed)
    }
}

#[derive(Debug, Clone)]
/// Unregister many users in one transaction. Returns the ids that existed.
pub struct UnregisterUsers {
    pub user_ids: Vec<i64>,
}

impl Processor<UnregisterUsers> for DatabaseProcessor {
    type Output = Vec<i64>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UnregisterUsers")]
    async fn process(&self, cmd: UnregisterUsers) -> Result<Vec<i64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut removed = Vec::with_capacity(cmd.user_ids.len());
        for user_id in cmd.user_ids {
            if (UnregisterUser { user_id }).execute_tx(&mut tx).await? {
                removed.push(user_id);
            }
        }
        tx.commit().await?;
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
/// Ban a user. An existing registration is marked banned and detached from
/// its memberships; otherwise a banned placeholder registration is created.
/// Returns whether the user was registered before.
pub struct BanUser {
    pub user_id: i64,
    pub username: String,
}

impl Processor<BanUser> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:BanUser")]
    async fn process(&self, cmd: BanUser) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE registrations SET banned = TRUE WHERE user_id = $1")
            .bind(cmd.user_id)
            .execute(&mut *tx)
            .await?;
        let was_registered = updated.rows_affected() > 0;

        if was_registered {
            detach_memberships_tx(&mut tx, cmd.user_id).await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO registrations (user_id, username, banned)
                VALUES ($1, $2, TRUE)
                ON CONFLICT (user_id) DO UPDATE SET banned = TRUE
                "#,
            )
            .bind(cmd.user_id)
            .bind(&cmd.username)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(user_id = cmd.user_id, was_registered, "Banned user");
        Ok(was_registered)
    }
}

#[derive(Debug, Clone)]
/// Lift a ban. Returns `false` when the user was not banned.
pub struct UnbanUser {
    pub user_id: i64,
}

impl Processor<UnbanUser> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UnbanUser")]
    async fn process(&self, cmd: UnbanUser) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE registrations SET banned = FALSE WHERE user_id = $1 AND banned = TRUE",
        )
        .bind(cmd.user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct IsUserBanned {
    pub user_id: i64,
}

impl Processor<IsUserBanned> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:IsUserBanned")]
    async fn process(&self, query: IsUserBanned) -> Result<bool, sqlx::Error> {
        let banned: Option<bool> =
            sqlx::query_scalar("SELECT banned FROM registrations WHERE user_id = $1")
                .bind(query.user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(banned.unwrap_or(false))
    }
}
