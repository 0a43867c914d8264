use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::proposals::{ProposalId, ProposalRecord, RecordStore, StoreError};

/// Store of record reached over a small JSON collection API.
///
/// `GET {base}` lists, `POST {base}` creates, `PUT {base}/{id}` replaces and
/// `DELETE {base}/{id}` removes a record.
#[derive(Debug, Clone)]
pub struct RemoteHttpStore {
    client: Client,
    base_url: String,
}

impl RemoteHttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, id: &ProposalId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn unexpected(status: StatusCode) -> StoreError {
    StoreError::Unavailable(format!("remote store answered {status}"))
}

#[async_trait]
impl RecordStore for RemoteHttpStore {
    fn name(&self) -> &'static str {
        "remote-http"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(unexpected(response.status()));
        }

        response
            .json::<Vec<ProposalRecord>>()
            .await
            .map_err(|err| StoreError::Corrupt(err.to_string()))
    }

    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&record)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => {
                debug!(proposal = %record.id, "remote store accepted proposal");
                Ok(record)
            }
            StatusCode::CONFLICT => Err(StoreError::Conflict(record.id)),
            status => Err(unexpected(status)),
        }
    }

    async fn upsert(&self, record: ProposalRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.record_url(&record.id))
            .json(&record)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(record.id)),
            status => Err(unexpected(status)),
        }
    }

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.record_url(id))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.clone())),
            status => Err(unexpected(status)),
        }
    }
}
