use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::origination::{generate_schedule, InstallmentSchedule, PricingTier};

use super::access::SessionToken;
use super::document::amount_in_words;
use super::domain::{ProposalId, ProposalStatus, ProposalSubmission, ProposalSummary};
use super::repository::{Notifier, RecordStore, StoreError};
use super::service::{ProposalService, ProposalServiceError};

/// Router builder exposing the simulator, intake, client lookup and staff endpoints.
pub fn proposal_router<L, R, N>(service: Arc<ProposalService<L, R, N>>) -> Router
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/pricing", get(pricing_handler::<L, R, N>))
        .route("/api/v1/quote", get(quote_handler::<L, R, N>))
        .route(
            "/api/v1/proposals",
            post(submit_handler::<L, R, N>).get(list_handler::<L, R, N>),
        )
        .route("/api/v1/proposals/lookup", post(lookup_handler::<L, R, N>))
        .route("/api/v1/proposals/export", get(export_handler::<L, R, N>))
        .route(
            "/api/v1/proposals/:proposal_id",
            axum::routing::delete(delete_handler::<L, R, N>),
        )
        .route(
            "/api/v1/proposals/:proposal_id/status",
            put(status_handler::<L, R, N>),
        )
        .route(
            "/api/v1/proposals/:proposal_id/contract",
            get(contract_handler::<L, R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub principal: Decimal,
    pub installments: u8,
}

/// Simulator answer: table pricing plus the schedule a submission made today would get.
#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub principal: Decimal,
    pub installment_count: u8,
    pub per_installment_payment: Decimal,
    pub total_payable: Decimal,
    pub total_in_words: String,
    pub due_dates: InstallmentSchedule,
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub tax_id: String,
    pub birth_date: String,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub proposals: Vec<ProposalSummary>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ProposalStatus,
}

pub(crate) async fn pricing_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
) -> Json<Vec<PricingTier>>
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    Json(service.pricing().tiers().to_vec())
}

pub(crate) async fn quote_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Query(params): Query<QuoteParams>,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let quote = match service.quote(params.principal, params.installments) {
        Ok(quote) => quote,
        Err(err) => return error_response(err.into()),
    };
    let due_dates = match generate_schedule(Local::now().date_naive(), quote.installment_count()) {
        Ok(schedule) => schedule,
        Err(err) => return error_response(err.into()),
    };
    let total_in_words = amount_in_words(quote.total_payable());

    let view = QuoteView {
        principal: quote.principal(),
        installment_count: quote.installment_count(),
        per_installment_payment: quote.per_installment_payment(),
        total_payable: quote.total_payable(),
        total_in_words,
        due_dates,
    };
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) async fn submit_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Json(submission): Json<ProposalSubmission>,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    match service.submit(submission).await {
        Ok(record) => (StatusCode::ACCEPTED, Json(record.summary())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    headers: HeaderMap,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let token = bearer_token(&headers);
    match service.list(token.as_ref()).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn lookup_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Json(request): Json<LookupRequest>,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    match service
        .find_by_identity(&request.tax_id, &request.birth_date)
        .await
    {
        Ok(records) => {
            let proposals = records.iter().map(|record| record.summary()).collect();
            (StatusCode::OK, Json(LookupResponse { proposals })).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Path(proposal_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<StatusRequest>,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let token = bearer_token(&headers);
    let id = ProposalId(proposal_id);
    match service.set_status(token.as_ref(), &id, request.status).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Path(proposal_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let token = bearer_token(&headers);
    match service.delete(token.as_ref(), &ProposalId(proposal_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn contract_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    Path(proposal_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let token = bearer_token(&headers);
    match service.contract(token.as_ref(), &ProposalId(proposal_id)).await {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<L, R, N>(
    State(service): State<Arc<ProposalService<L, R, N>>>,
    headers: HeaderMap,
) -> Response
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    let token = bearer_token(&headers);
    match service.export_csv(token.as_ref()).await {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(SessionToken::from_bearer)
}

fn error_response(err: ProposalServiceError) -> Response {
    let status = service_error_status(&err);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) fn service_error_status(err: &ProposalServiceError) -> StatusCode {
    match err {
        ProposalServiceError::Intake(_)
        | ProposalServiceError::Quote(_)
        | ProposalServiceError::Schedule(_)
        | ProposalServiceError::Identity(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ProposalServiceError::Transition(_) | ProposalServiceError::Store(StoreError::Conflict(_)) => {
            StatusCode::CONFLICT
        }
        ProposalServiceError::Access(_) => StatusCode::UNAUTHORIZED,
        ProposalServiceError::NotFound(_) | ProposalServiceError::Store(StoreError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        ProposalServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ProposalServiceError::Store(StoreError::Corrupt(_)) => StatusCode::BAD_GATEWAY,
        ProposalServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
