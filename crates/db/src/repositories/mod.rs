use async_trait::async_trait;
use thiserror::Error;

use phoenix_core::chrono::{DateTime, Utc};
use phoenix_core::{AccessRecord, Principal};

pub mod access_log;
pub mod memory;

pub use access_log::SqlAccessLedger;
pub use memory::InMemoryAccessLedger;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only, queryable store of per-principal access records.
///
/// Rate limiting leans entirely on this store's read/write visibility: there
/// is no in-process lock, so two concurrent requests can both pass the
/// limiter before either append lands. The limit is deliberately soft;
/// callers needing hard quotas would add a conditional write here.
#[async_trait]
pub trait AccessLedger: Send + Sync {
    /// Appends one record. Duplicate appends on retry are acceptable; the
    /// ledger serves rate limiting and audit, not billing.
    async fn append(&self, record: AccessRecord) -> Result<(), RepositoryError>;

    /// Counts a principal's records with `from <= asked_at <= until`
    /// (closed interval on both bounds).
    async fn count_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Lists a principal's records in the same closed interval, in
    /// chronological order. Used for audit inspection.
    async fn list_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<AccessRecord>, RepositoryError>;
}
