use async_trait::async_trait;
use serde::Serialize;

use super::domain::{ProposalId, ProposalRecord};

/// Storage abstraction shared by the local cache and the remote store of record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError>;

    async fn fetch(&self, id: &ProposalId) -> Result<Option<ProposalRecord>, StoreError> {
        Ok(self.list().await?.into_iter().find(|record| &record.id == id))
    }

    /// Append a new record. Fails with [`StoreError::Conflict`] if the id is taken.
    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError>;

    /// Replace the record with the same id, or add it when absent.
    async fn upsert(&self, record: ProposalRecord) -> Result<(), StoreError>;

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("proposal {0} already exists")]
    Conflict(ProposalId),
    #[error("proposal {0} not found")]
    NotFound(ProposalId),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store returned unreadable data: {0}")]
    Corrupt(String),
}

/// Outbound hook fired after a proposal is stored (e-mail relay, chat, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: ProposalEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalEvent {
    Submitted {
        record: Box<ProposalRecord>,
        subject: String,
        body: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification relay rejected the message with status {0}")]
    Rejected(u16),
}
