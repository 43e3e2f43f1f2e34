use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use phoenix_core::chrono::{DateTime, Utc};
use phoenix_core::{ledger_timestamp, AccessRecord, Principal};

use super::{AccessLedger, RepositoryError};
use crate::DbPool;

pub struct SqlAccessLedger {
    pool: DbPool,
}

impl SqlAccessLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AccessLedger for SqlAccessLedger {
    async fn append(&self, record: AccessRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO access_log (id, principal, asked_at, question)
             VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.principal.0)
        .bind(ledger_timestamp(record.asked_at))
        .bind(&record.question)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_log
             WHERE principal = ? AND asked_at >= ? AND asked_at <= ?",
        )
        .bind(&principal.0)
        .bind(ledger_timestamp(from))
        .bind(ledger_timestamp(until))
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(count).map_err(|_| {
            RepositoryError::Decode(format!("negative access_log count for `{}`", principal.0))
        })
    }

    async fn list_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<AccessRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT principal, asked_at, question FROM access_log
             WHERE principal = ? AND asked_at >= ? AND asked_at <= ?
             ORDER BY asked_at ASC",
        )
        .bind(&principal.0)
        .bind(ledger_timestamp(from))
        .bind(ledger_timestamp(until))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: SqliteRow) -> Result<AccessRecord, RepositoryError> {
    let asked_at_raw = row.try_get::<String, _>("asked_at")?;
    let asked_at = DateTime::parse_from_rfc3339(&asked_at_raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!(
                "invalid timestamp in `asked_at`: `{asked_at_raw}` ({error})"
            ))
        })?;

    Ok(AccessRecord {
        principal: Principal(row.try_get("principal")?),
        asked_at,
        question: row.try_get("question")?,
    })
}
