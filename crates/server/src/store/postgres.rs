use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, types::Json};

use super::{PollStore, StoreError, apply_vote};
use crate::models::{NewPoll, Poll, PollOption, PollSettings};

pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS polls (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    question TEXT NOT NULL,
    description TEXT,
    options JSONB NOT NULL DEFAULT '[]'::jsonb,
    author TEXT,
    created_by UUID NOT NULL,
    total_votes INTEGER NOT NULL DEFAULT 0,
    settings JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const SELECT_POLLS: &str = r#"
SELECT id::text AS id, question, description, options, author,
       created_by::text AS created_by, created_at, settings
FROM polls
ORDER BY created_at DESC
"#;

const SELECT_POLL: &str = r#"
SELECT id::text AS id, question, description, options, author,
       created_by::text AS created_by, created_at, settings
FROM polls
WHERE id = $1::uuid
"#;

const INSERT_POLL: &str = r#"
INSERT INTO polls (question, description, options, author, created_by, total_votes, settings)
VALUES ($1, $2, $3, $4, $5::uuid, 0, $6)
RETURNING id::text AS id, question, description, options, author,
          created_by::text AS created_by, created_at, settings
"#;

#[derive(Debug, sqlx::FromRow)]
struct PollRow {
    id: String,
    question: String,
    description: Option<String>,
    options: Option<Json<Vec<PollOption>>>,
    author: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    settings: Option<Json<PollSettings>>,
}

impl From<PollRow> for Poll {
    fn from(row: PollRow) -> Self {
        Poll {
            id: row.id,
            question: row.question,
            description: row.description,
            options: row.options.map(|o| o.0).unwrap_or_default(),
            author: row.author,
            created_by: row.created_by,
            created_at: row.created_at,
            settings: row.settings.map(|s| s.0).unwrap_or_default(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // undefined_table
                Some("42P01") => StoreError::TableMissing,
                // invalid_text_representation: the id is not a uuid
                Some("22P02") => StoreError::NotFound,
                _ => StoreError::Backend(err.to_string()),
            },
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Value for the `integer` total column, saturated at `i32::MAX`. Reads
/// always recompute the total from the options.
fn stored_total(poll_id: &str, options: &[PollOption]) -> i32 {
    let total: i64 = options.iter().map(|o| i64::from(o.votes)).sum();
    i32::try_from(total).unwrap_or_else(|_| {
        tracing::warn!(poll_id, total, "total_votes exceeds the column range, saturating");
        i32::MAX
    })
}

/// Poll table in the Supabase Postgres database.
#[derive(Debug, Clone)]
pub struct PgPollStore {
    db: PgPool,
}

impl PgPollStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_table(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.db).await?;
        Ok(())
    }

    pub async fn question_exists(&self, question: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM polls WHERE question = $1)")
            .bind(question)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl PollStore for PgPollStore {
    async fn list(&self) -> Result<Vec<Poll>, StoreError> {
        let rows: Vec<PollRow> = sqlx::query_as(SELECT_POLLS).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(Poll::from).collect())
    }

    async fn get(&self, id: &str) -> Result<Poll, StoreError> {
        let row: Option<PollRow> = sqlx::query_as(SELECT_POLL)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(Poll::from).ok_or(StoreError::NotFound)
    }

    async fn insert(&self, poll: NewPoll) -> Result<Poll, StoreError> {
        let row: PollRow = sqlx::query_as(INSERT_POLL)
            .bind(&poll.question)
            .bind(&poll.description)
            .bind(Json(&poll.options))
            .bind(&poll.author)
            .bind(&poll.created_by)
            .bind(Json(&poll.settings))
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn record_vote(&self, id: &str, option_ids: &[String]) -> Result<usize, StoreError> {
        let mut tx = self.db.begin().await?;

        // Row lock: concurrent ballots on the same poll queue up here.
        let row: Option<(Option<Json<Vec<PollOption>>>,)> =
            sqlx::query_as("SELECT options FROM polls WHERE id = $1::uuid FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((options,)) = row else {
            return Err(StoreError::NotFound);
        };

        let mut options = options.map(|o| o.0).unwrap_or_default();
        let matched = apply_vote(&mut options, option_ids);
        let total = stored_total(id, &options);

        sqlx::query("UPDATE polls SET options = $1, total_votes = $2 WHERE id = $3::uuid")
            .bind(Json(&options))
            .bind(total)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(matched)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
