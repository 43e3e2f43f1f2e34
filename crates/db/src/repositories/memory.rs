use tokio::sync::RwLock;

use phoenix_core::chrono::{DateTime, Utc};
use phoenix_core::{AccessRecord, Principal};

use super::{AccessLedger, RepositoryError};

/// Test and single-process stand-in for the SQL ledger. Same closed-interval
/// window semantics as [`SqlAccessLedger`](super::SqlAccessLedger).
#[derive(Default)]
pub struct InMemoryAccessLedger {
    records: RwLock<Vec<AccessRecord>>,
}

impl InMemoryAccessLedger {
    pub async fn all_records(&self) -> Vec<AccessRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl AccessLedger for InMemoryAccessLedger {
    async fn append(&self, record: AccessRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn count_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let records = self.records.read().await;
        let count = records
            .iter()
            .filter(|record| {
                record.principal == *principal
                    && record.asked_at >= from
                    && record.asked_at <= until
            })
            .count();
        Ok(count as u64)
    }

    async fn list_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<AccessRecord>, RepositoryError> {
        let records = self.records.read().await;
        let mut matching: Vec<AccessRecord> = records
            .iter()
            .filter(|record| {
                record.principal == *principal
                    && record.asked_at >= from
                    && record.asked_at <= until
            })
            .cloned()
            .collect();
        matching.sort_by_key(|record| record.asked_at);
        Ok(matching)
    }
}
