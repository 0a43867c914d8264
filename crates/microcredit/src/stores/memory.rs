use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::proposals::{ProposalId, ProposalRecord, RecordStore, StoreError};

/// Process-local store, newest record first. Used for demos, tests and as a cache stand-in.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<ProposalRecord>>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<ProposalRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, Vec<ProposalRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        Ok(self.guard()?.clone())
    }

    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        let mut records = self.guard()?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Conflict(record.id));
        }
        records.insert(0, record.clone());
        Ok(record)
    }

    async fn upsert(&self, record: ProposalRecord) -> Result<(), StoreError> {
        let mut records = self.guard()?;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.insert(0, record),
        }
        Ok(())
    }

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError> {
        let mut records = self.guard()?;
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::tests::common::{applicant, record_at};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn keeps_newest_first_and_rejects_duplicates() {
        let store = MemoryStore::default();
        let older = record_at(applicant(), dec!(100), 1, "2024-01-01T10:00:00-03:00");
        let newer = record_at(applicant(), dec!(200), 2, "2024-01-02T10:00:00-03:00");

        store.insert(older.clone()).await.expect("insert older");
        store.insert(newer.clone()).await.expect("insert newer");
        assert!(matches!(
            store.insert(older.clone()).await,
            Err(StoreError::Conflict(_))
        ));

        let ids: Vec<_> = store.list().await.expect("list").into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn remove_reports_missing_ids() {
        let store = MemoryStore::default();
        let missing = ProposalId("NOPE".to_string());
        assert!(matches!(
            store.remove(&missing).await,
            Err(StoreError::NotFound(id)) if id == missing
        ));
    }
}
