use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::origination::PricingTable;
use crate::proposals::{
    proposal_router, ApplicantDetails, CreditorProfile, InstrumentAssembler, Notifier,
    NotifyError, PersonalReference, PostalAddress, ProposalEvent, ProposalId, ProposalRecord,
    ProposalService, ProposalSubmission, RecordStore, SessionToken, StaticTokenAuthenticator,
    StoreError,
};
use crate::stores::MemoryStore;

pub(crate) const STAFF_TOKEN: &str = "staff-token";

pub(crate) fn applicant() -> ApplicantDetails {
    ApplicantDetails {
        full_name: "Maria da Silva".to_string(),
        nationality: "brasileira".to_string(),
        marital_status: "solteira".to_string(),
        profession: "costureira".to_string(),
        identity_document: "1234567".to_string(),
        issuing_authority: "SSP/AL".to_string(),
        tax_id: "123.456.789-01".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).expect("valid date"),
        whatsapp: "(82) 99999-0000".to_string(),
        email: "maria@example.com".to_string(),
        address: PostalAddress {
            postal_code: "57000-000".to_string(),
            street: "Rua das Flores".to_string(),
            number: "42".to_string(),
            complement: Some("casa 2".to_string()),
            neighborhood: "Centro".to_string(),
            city: "Maceió".to_string(),
            state: "AL".to_string(),
        },
        monthly_income: "2500".to_string(),
        work_situation: "autônoma".to_string(),
        payout_key: "maria@example.com".to_string(),
        first_reference: PersonalReference {
            name: "João Souza".to_string(),
            relationship: "irmão".to_string(),
            phone: "(82) 98888-1111".to_string(),
        },
        second_reference: PersonalReference {
            name: "Ana Lima".to_string(),
            relationship: "vizinha".to_string(),
            phone: "(82) 97777-2222".to_string(),
        },
    }
}

pub(crate) fn other_applicant() -> ApplicantDetails {
    ApplicantDetails {
        full_name: "José Pereira".to_string(),
        tax_id: "98765432100".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1985, 11, 2).expect("valid date"),
        payout_key: "+5582911112222".to_string(),
        ..applicant()
    }
}

pub(crate) fn submission(principal: Decimal, installment_count: u8) -> ProposalSubmission {
    ProposalSubmission {
        applicant: applicant(),
        principal,
        installment_count,
    }
}

/// Pending record priced from the standard table and stamped at `submitted_at` (RFC 3339).
pub(crate) fn record_at(
    applicant: ApplicantDetails,
    principal: Decimal,
    installment_count: u8,
    submitted_at: &str,
) -> ProposalRecord {
    let quote = PricingTable::standard()
        .quote(principal, installment_count)
        .expect("standard table entry");
    let submitted_at = DateTime::parse_from_rfc3339(submitted_at).expect("rfc3339 timestamp");
    ProposalRecord::create(ProposalId::generate(), submitted_at, applicant, &quote)
        .expect("schedule within range")
}

pub(crate) fn staff_token() -> SessionToken {
    SessionToken::new(STAFF_TOKEN)
}

pub(crate) fn authenticator() -> Arc<StaticTokenAuthenticator> {
    Arc::new(StaticTokenAuthenticator::new(vec![(
        "analyst".to_string(),
        STAFF_TOKEN.to_string(),
    )]))
}

pub(crate) fn assembler() -> InstrumentAssembler {
    InstrumentAssembler::new(CreditorProfile {
        name: "Fomento Exemplo Ltda".to_string(),
        qualification: "pessoa jurídica de direito privado".to_string(),
        tax_id: "00.000.000/0001-00".to_string(),
        city: "Maceió/AL".to_string(),
    })
}

pub(crate) type LocalOnlyService = ProposalService<MemoryStore, MemoryStore, RecordingNotifier>;

/// Service with a memory cache and no remote store.
pub(crate) fn local_only_service() -> (LocalOnlyService, MemoryStore, RecordingNotifier) {
    let cache = MemoryStore::default();
    let notifier = RecordingNotifier::default();
    let service = ProposalService::new(
        Arc::new(cache.clone()),
        None,
        Arc::new(notifier.clone()),
        authenticator(),
        assembler(),
    );
    (service, cache, notifier)
}

pub(crate) fn service_with_remote<R: RecordStore + 'static>(
    cache: MemoryStore,
    remote: R,
) -> (ProposalService<MemoryStore, R, RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let service = ProposalService::new(
        Arc::new(cache),
        Some(Arc::new(remote)),
        Arc::new(notifier.clone()),
        authenticator(),
        assembler(),
    );
    (service, notifier)
}

pub(crate) fn router_with_service<L, R, N>(service: ProposalService<L, R, N>) -> axum::Router
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    proposal_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(crate) struct RecordingNotifier {
    events: Arc<Mutex<Vec<ProposalEvent>>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<ProposalEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: ProposalEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(crate) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: ProposalEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("relay offline".to_string()))
    }
}

pub(crate) struct UnavailableStore;

#[async_trait]
impl RecordStore for UnavailableStore {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn insert(&self, _record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn upsert(&self, _record: ProposalRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    async fn remove(&self, _id: &ProposalId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }
}

pub(crate) struct ConflictStore;

#[async_trait]
impl RecordStore for ConflictStore {
    fn name(&self) -> &'static str {
        "conflict"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        Err(StoreError::Conflict(record.id))
    }

    async fn upsert(&self, _record: ProposalRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError> {
        Err(StoreError::NotFound(id.clone()))
    }
}

/// Memory store whose first insert reports an id collision.
#[derive(Default, Clone)]
pub(crate) struct CollidingOnceStore {
    pub(crate) inner: MemoryStore,
    rejected: Arc<Mutex<Vec<ProposalId>>>,
}

impl CollidingOnceStore {
    pub(crate) fn rejected_ids(&self) -> Vec<ProposalId> {
        self.rejected.lock().expect("rejected ids mutex poisoned").clone()
    }
}

#[async_trait]
impl RecordStore for CollidingOnceStore {
    fn name(&self) -> &'static str {
        "colliding-once"
    }

    async fn list(&self) -> Result<Vec<ProposalRecord>, StoreError> {
        self.inner.list().await
    }

    async fn insert(&self, record: ProposalRecord) -> Result<ProposalRecord, StoreError> {
        {
            let mut rejected = self.rejected.lock().expect("rejected ids mutex poisoned");
            if rejected.is_empty() {
                rejected.push(record.id.clone());
                return Err(StoreError::Conflict(record.id));
            }
        }
        self.inner.insert(record).await
    }

    async fn upsert(&self, record: ProposalRecord) -> Result<(), StoreError> {
        self.inner.upsert(record).await
    }

    async fn remove(&self, id: &ProposalId) -> Result<(), StoreError> {
        self.inner.remove(id).await
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(crate) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
