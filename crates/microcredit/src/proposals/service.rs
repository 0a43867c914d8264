use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::origination::{PricingTable, Quote, QuoteError, ScheduleError};

use super::access::{AccessError, Authenticator, SessionToken, StaffSession};
use super::document::InstrumentAssembler;
use super::export::write_csv;
use super::domain::{
    ApplicantDetails, ProposalId, ProposalRecord, ProposalStatus, ProposalSubmission,
    TransitionError,
};
use super::reconciliation::{
    find_by_identity, merge_all, tax_id_digits, IdentityQuery, IdentityQueryError,
};
use super::repository::{Notifier, ProposalEvent, RecordStore, StoreError};

const TAX_ID_DIGITS: usize = 11;

/// Facade over pricing, the two record stores, the notifier and the staff gate.
///
/// `L` is the local cache. `R` is the remote store of record; when no remote store is
/// configured the cache doubles as the store of record.
pub struct ProposalService<L, R, N> {
    pricing: Arc<PricingTable>,
    cache: Arc<L>,
    remote: Option<Arc<R>>,
    notifier: Arc<N>,
    authenticator: Arc<dyn Authenticator>,
    assembler: Arc<InstrumentAssembler>,
}

impl<L, R, N> ProposalService<L, R, N>
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        cache: Arc<L>,
        remote: Option<Arc<R>>,
        notifier: Arc<N>,
        authenticator: Arc<dyn Authenticator>,
        assembler: InstrumentAssembler,
    ) -> Self {
        Self {
            pricing: Arc::new(PricingTable::standard()),
            cache,
            remote,
            notifier,
            authenticator,
            assembler: Arc::new(assembler),
        }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn assembler(&self) -> &InstrumentAssembler {
        &self.assembler
    }

    pub fn quote(&self, principal: Decimal, installments: u8) -> Result<Quote, QuoteError> {
        self.pricing.quote(principal, installments)
    }

    /// Price, persist, and announce a new proposal stamped with the current local time.
    pub async fn submit(
        &self,
        submission: ProposalSubmission,
    ) -> Result<ProposalRecord, ProposalServiceError> {
        self.submit_at(submission, Local::now().fixed_offset()).await
    }

    /// Like [`submit`](Self::submit) with an explicit submission instant.
    ///
    /// The record is written to the cache and to the remote store; the call fails only when
    /// neither accepted it. Notification failures are logged and otherwise ignored.
    pub async fn submit_at(
        &self,
        submission: ProposalSubmission,
        submitted_at: DateTime<FixedOffset>,
    ) -> Result<ProposalRecord, ProposalServiceError> {
        let ProposalSubmission {
            applicant,
            principal,
            installment_count,
        } = submission;

        validate_applicant(&applicant)?;
        let quote = self.pricing.quote(principal, installment_count)?;
        let record = ProposalRecord::create(ProposalId::generate(), submitted_at, applicant, &quote)?;

        let stored = match self.store_new(&record).await {
            Err(StoreError::Conflict(taken)) => {
                warn!(proposal = %taken, "generated proposal id already taken; retrying with a fresh id");
                let retry = ProposalRecord {
                    id: ProposalId::generate(),
                    ..record
                };
                self.store_new(&retry).await?
            }
            other => other?,
        };

        info!(
            proposal = %stored.id,
            principal = %stored.principal,
            installments = stored.installment_count,
            total = %stored.total_payable,
            "proposal submitted"
        );

        self.announce(&stored).await;
        Ok(stored)
    }

    /// Merged view of both stores, remote copies first. Staff only.
    ///
    /// Records the remote store never accepted appear here from the cache, but status
    /// changes and deletion address the store of record and report them as not found
    /// until they are re-synced.
    pub async fn list(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<Vec<ProposalRecord>, ProposalServiceError> {
        self.authorize(token)?;
        Ok(self.merged_records().await)
    }

    /// Single record from the merged view. Staff only.
    pub async fn get(
        &self,
        token: Option<&SessionToken>,
        id: &ProposalId,
    ) -> Result<ProposalRecord, ProposalServiceError> {
        self.authorize(token)?;
        self.merged_records()
            .await
            .into_iter()
            .find(|record| &record.id == id)
            .ok_or_else(|| ProposalServiceError::NotFound(id.clone()))
    }

    /// Render the debt instrument for a record. Staff only.
    pub async fn contract(
        &self,
        token: Option<&SessionToken>,
        id: &ProposalId,
    ) -> Result<String, ProposalServiceError> {
        let record = self.get(token, id).await?;
        Ok(self.assembler.render(&record))
    }

    /// CSV of the merged proposal list. Staff only.
    pub async fn export_csv(
        &self,
        token: Option<&SessionToken>,
    ) -> Result<Vec<u8>, ProposalServiceError> {
        let session = self.authorize(token)?;
        let records = self.merged_records().await;
        let mut buffer = Vec::new();
        let exported = write_csv(&records, &mut buffer)?;
        info!(records = exported, staff = %session.subject, "proposals exported");
        Ok(buffer)
    }

    /// Set a proposal's status in the store of record.
    ///
    /// Writes are last-write-wins: there is no version check between concurrent reviewers.
    /// Re-applying the current status returns the record without writing.
    pub async fn set_status(
        &self,
        token: Option<&SessionToken>,
        id: &ProposalId,
        status: ProposalStatus,
    ) -> Result<ProposalRecord, ProposalServiceError> {
        let session = self.authorize(token)?;
        let store = self.store_of_record();

        let current = store
            .fetch(id)
            .await?
            .ok_or_else(|| ProposalServiceError::NotFound(id.clone()))?;
        let updated = current.with_status(status)?;
        if updated == current {
            return Ok(current);
        }

        store.upsert(updated.clone()).await?;
        info!(proposal = %id, from = %current.status, to = %status, staff = %session.subject, "proposal status changed");

        if self.remote.is_some() {
            if let Err(err) = self.cache.upsert(updated.clone()).await {
                warn!(proposal = %id, error = %err, "local cache not refreshed after status change");
            }
        }

        Ok(updated)
    }

    /// Permanently remove a proposal from the store of record and the cache.
    pub async fn delete(
        &self,
        token: Option<&SessionToken>,
        id: &ProposalId,
    ) -> Result<(), ProposalServiceError> {
        let session = self.authorize(token)?;
        self.store_of_record().remove(id).await.map_err(|err| match err {
            StoreError::NotFound(id) => ProposalServiceError::NotFound(id),
            other => other.into(),
        })?;

        if self.remote.is_some() {
            match self.cache.remove(id).await {
                Ok(()) | Err(StoreError::NotFound(_)) => {}
                Err(err) => {
                    warn!(proposal = %id, error = %err, "local cache still holds deleted proposal")
                }
            }
        }

        info!(proposal = %id, staff = %session.subject, "proposal deleted");
        Ok(())
    }

    /// Applicant self-service lookup by CPF and birth date, newest first.
    ///
    /// Not an authentication mechanism; see [`IdentityQuery`].
    pub async fn find_by_identity(
        &self,
        tax_id: &str,
        birth_date: &str,
    ) -> Result<Vec<ProposalRecord>, ProposalServiceError> {
        let query = IdentityQuery::parse(tax_id, birth_date)?;
        let mut matches = find_by_identity(&self.merged_records().await, &query);
        matches.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(matches)
    }

    /// Write a new record to the cache and, when configured, the remote store. Succeeds when
    /// either accepted it.
    async fn store_new(&self, record: &ProposalRecord) -> Result<ProposalRecord, StoreError> {
        let cached = self.cache.insert(record.clone()).await;
        let Some(remote) = &self.remote else {
            return cached;
        };

        match (cached, remote.insert(record.clone()).await) {
            (Ok(_), Ok(stored)) => Ok(stored),
            (Err(cache_err), Ok(stored)) => {
                warn!(proposal = %record.id, error = %cache_err, "local cache rejected new proposal; stored remotely");
                Ok(stored)
            }
            (Ok(stored), Err(err)) => {
                warn!(
                    proposal = %record.id,
                    store = remote.name(),
                    error = %err,
                    reviewable = false,
                    "remote store rejected new proposal; kept in local cache until re-synced"
                );
                Ok(stored)
            }
            (Err(cache_err), Err(err)) => {
                warn!(proposal = %record.id, error = %cache_err, "local cache rejected new proposal");
                Err(err)
            }
        }
    }

    fn authorize(&self, token: Option<&SessionToken>) -> Result<StaffSession, AccessError> {
        self.authenticator.authenticate(token).inspect_err(|err| {
            warn!(error = %err, "staff operation refused");
        })
    }

    fn store_of_record(&self) -> &dyn RecordStore {
        match &self.remote {
            Some(remote) => remote.as_ref() as &dyn RecordStore,
            None => self.cache.as_ref() as &dyn RecordStore,
        }
    }

    async fn merged_records(&self) -> Vec<ProposalRecord> {
        let local = match self.cache.list().await {
            Ok(records) => records,
            Err(err) => {
                warn!(store = self.cache.name(), error = %err, "local cache unreadable; continuing without it");
                Vec::new()
            }
        };

        let remote = match &self.remote {
            Some(remote) => match remote.list().await {
                Ok(records) => records,
                Err(err) => {
                    warn!(store = remote.name(), error = %err, "remote store unreachable; serving local records only");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        merge_all(local, remote)
    }

    async fn announce(&self, record: &ProposalRecord) {
        let event = ProposalEvent::Submitted {
            record: Box::new(record.clone()),
            subject: self.assembler.notification_subject(record),
            body: self.assembler.render_summary(record),
        };

        if let Err(err) = self.notifier.notify(event).await {
            warn!(proposal = %record.id, error = %err, "proposal notification not delivered");
        }
    }
}

fn validate_applicant(applicant: &ApplicantDetails) -> Result<(), IntakeError> {
    if applicant.full_name.trim().is_empty() {
        return Err(IntakeError::MissingField("full_name"));
    }

    let digits = tax_id_digits(&applicant.tax_id);
    if digits.len() != TAX_ID_DIGITS {
        return Err(IntakeError::MalformedTaxId(applicant.tax_id.clone()));
    }

    Ok(())
}

/// Intake validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("tax id '{0}' must contain exactly 11 digits")]
    MalformedTaxId(String),
}

/// Error raised by the proposal service.
#[derive(Debug, thiserror::Error)]
pub enum ProposalServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Identity(#[from] IdentityQueryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
    #[error("proposal {0} not found")]
    NotFound(ProposalId),
}
