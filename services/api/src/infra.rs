use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use microcredit::collaborators::{
    AddressLookup, Assistant, GeminiAssistant, MailRelayNotifier, ViaCepClient,
};
use microcredit::config::AppConfig;
use microcredit::error::AppError;
use microcredit::proposals::{InstrumentAssembler, ProposalService, StaticTokenAuthenticator};
use microcredit::stores::{LocalFileStore, RemoteHttpStore};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) type LiveProposalService =
    ProposalService<LocalFileStore, RemoteHttpStore, MailRelayNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Outbound helpers that sit beside the proposal service: CEP autofill and the chat assistant.
#[derive(Clone)]
pub(crate) struct Integrations {
    pub(crate) address: Arc<dyn AddressLookup>,
    pub(crate) assistant: Arc<dyn Assistant>,
}

pub(crate) fn build_proposal_service(config: &AppConfig) -> Result<LiveProposalService, AppError> {
    let storage = &config.storage;
    let cache = Arc::new(LocalFileStore::open(&storage.local_path));

    let remote = match &storage.remote_url {
        Some(url) => {
            info!(%url, "remote store of record configured");
            Some(Arc::new(RemoteHttpStore::new(url, storage.timeout)?))
        }
        None => {
            info!(path = %storage.local_path.display(), "no remote store configured; local cache is the store of record");
            None
        }
    };

    let notifier = MailRelayNotifier::new(
        config.notify.webhook_url.clone(),
        config.notify.recipient.clone(),
        storage.timeout,
    )
    .map_err(|err| AppError::integration("mail relay", err))?;

    let authenticator = StaticTokenAuthenticator::new(config.access.staff_tokens.clone());
    if authenticator.is_empty() {
        warn!("STAFF_TOKENS is empty; every staff request will be refused");
    }

    Ok(ProposalService::new(
        cache,
        remote,
        Arc::new(notifier),
        Arc::new(authenticator),
        InstrumentAssembler::new(config.creditor.clone()),
    ))
}

pub(crate) fn build_integrations(config: &AppConfig) -> Result<Integrations, AppError> {
    let timeout = config.storage.timeout;
    let address = ViaCepClient::new(&config.integrations.address_lookup_url, timeout)
        .map_err(|err| AppError::integration("address lookup", err))?;
    let assistant = GeminiAssistant::new(config.integrations.assistant_api_key.clone(), timeout)
        .map_err(|err| AppError::integration("assistant", err))?;

    Ok(Integrations {
        address: Arc::new(address),
        assistant: Arc::new(assistant),
    })
}

/// Parse a BRL amount typed on the command line: "300", "300.50", "300,50" or "R$ 1.234,56".
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&normalized)
        .map_err(|err| format!("failed to parse '{raw}' as an amount ({err})"))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
