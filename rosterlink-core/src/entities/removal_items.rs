use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

/// Checkpoint state of one platform kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "removal_status")]
pub enum RemovalStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RemovalItem {
    pub id: i64,
    pub batch_id: Uuid,
    pub tournament_id: String,
    pub external_id: String,
    pub display_name: String,
    pub status: RemovalStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
}

/// A participant to add to a new batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    pub external_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
/// Persist a new batch with every target `pending`. Targets repeating an
/// external id are stored once. Returns the number of stored items.
pub struct CreateRemovalBatch {
    pub batch_id: Uuid,
    pub tournament_id: String,
    pub targets: Vec<RemovalTarget>,
}

impl Processor<CreateRemovalBatch> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateRemovalBatch")]
    async fn process(&self, cmd: CreateRemovalBatch) -> Result<u64, sqlx::Error> {
        if cmd.targets.is_empty() {
            return Ok(0);
        }

        let mut query_builder = sqlx::QueryBuilder::new(
            "INSERT INTO removal_items (batch_id, tournament_id, external_id, display_name) ",
        );
        query_builder.push_values(cmd.targets, |mut b, target| {
            b.push_bind(cmd.batch_id)
                .push_bind(cmd.tournament_id.clone())
                .push_bind(target.external_id)
                .push_bind(target.display_name);
        });
        query_builder.push(" ON CONFLICT (batch_id, external_id) DO NOTHING");

        let result = query_builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone, Copy)]
/// Items of a batch that have not succeeded yet, in insertion order.
pub struct GetOutstandingRemovalItems {
    pub batch_id: Uuid,
}

impl Processor<GetOutstandingRemovalItems> for DatabaseProcessor {
    type Output = Vec<RemovalItem>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOutstandingRemovalItems")]
    async fn process(
        &self,
        query: GetOutstandingRemovalItems,
    ) -> Result<Vec<RemovalItem>, sqlx::Error> {
        sqlx::query_as::<_, RemovalItem>(
            r#"
            SELECT id, batch_id, tournament_id, external_id, display_name, status, attempts, last_error
            FROM removal_items
            WHERE batch_id = $1 AND status <> 'succeeded'
            ORDER BY id
            "#,
        )
        .bind(query.batch_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone, Copy)]
/// Tournament a batch belongs to, if the batch exists.
pub struct GetRemovalBatchTournament {
    pub batch_id: Uuid,
}

impl Processor<GetRemovalBatchTournament> for DatabaseProcessor {
    type Output = Option<String>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetRemovalBatchTournament")]
    async fn process(&self, query: GetRemovalBatchTournament) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT tournament_id FROM removal_items WHERE batch_id = $1 LIMIT 1")
            .bind(query.batch_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Checkpoint the outcome of one kick attempt.
pub struct RecordRemovalOutcome {
    pub item_id: i64,
    /// `None` on success, the error message otherwise.
    pub error: Option<String>,
}

impl Processor<RecordRemovalOutcome> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RecordRemovalOutcome")]
    async fn process(&self, cmd: RecordRemovalOutcome) -> Result<(), sqlx::Error> {
        let status = if cmd.error.is_some() {
            RemovalStatus::Failed
        } else {
            RemovalStatus::Succeeded
        };
        sqlx::query(
            r#"
            UPDATE removal_items
            SET status = $1,
                attempts = attempts + 1,
                last_error = $2,
                updated_at = NOW() AT TIME ZONE 'UTC'
            WHERE id = $3
            "#,
        )
        .bind(status)
        .bind(cmd.error)
        .bind(cmd.item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
