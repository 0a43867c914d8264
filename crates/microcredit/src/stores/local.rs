use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::proposals::{ProposalId, ProposalRecord, RecordStore, StoreError};

/// JSON-file cache holding every proposal submitted from this host, newest first.
///
/// The whole file is rewritten on each mutation through a temporary sibling and a rename, so
/// readers never observe a half-written document.
#[derive(Debug)]
pub struct LocalFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalFileStore {
    /// Open (or lazily create) the cache at `path`. Parent directories are created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Unavailable(err.to_string())),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| StoreError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    async fn write_all(&self, records: &[ProposalRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        }

        let payload = serde_json::to_vec_pretty(records)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let staging = self.path.with_extension("json.tmp");

        tokio::fs::write(&staging, payload)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        debug!(path = %self.path.display(), records = records.len(), "local cache persisted");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalFileStore {
    fn name(&self) -> &'static str {
        "local-file"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Conflict(record.id));
        }
        records.insert(0, record.clone());
        self.write_all(&records).await?;
        Ok(record)
    }

    async fn upsert(&self, record: ProposalRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record,
            None => records.insert(0, record),
        }
        self.write_all(&records).await
    }

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let before = records.len();
        records.retain(|record| &record.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.write_all(&records).await
    }
}
