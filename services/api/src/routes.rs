use crate::infra::{AppState, Integrations};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use microcredit::collaborators::{AddressError, PostalCode};
use microcredit::proposals::{proposal_router, Notifier, ProposalService, RecordStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct AssistantRequest {
    pub(crate) message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssistantReply {
    pub(crate) answer: String,
}

pub(crate) fn with_platform_routes<L, R, N>(service: Arc<ProposalService<L, R, N>>) -> axum::Router
where
    L: RecordStore + 'static,
    R: RecordStore + 'static,
    N: Notifier + 'static,
{
    proposal_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/address/:postal_code",
            axum::routing::get(address_endpoint),
        )
        .route("/api/v1/assistant", axum::routing::post(assistant_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn address_endpoint(
    Extension(integrations): Extension<Integrations>,
    Path(raw): Path<String>,
) -> Response {
    let lookup = match PostalCode::parse(&raw) {
        Ok(code) => integrations.address.lookup(&code).await,
        Err(err) => Err(err),
    };

    match lookup {
        Ok(address) => (StatusCode::OK, Json(address)).into_response(),
        Err(err) => {
            let status = match err {
                AddressError::InvalidPostalCode(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AddressError::NotFound(_) => StatusCode::NOT_FOUND,
                AddressError::Unavailable(_) => StatusCode::BAD_GATEWAY,
            };
            (status, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

/// Always answers 200; upstream failures are replaced by the fixed fallback reply.
pub(crate) async fn assistant_endpoint(
    Extension(integrations): Extension<Integrations>,
    Json(request): Json<AssistantRequest>,
) -> Json<AssistantReply> {
    let answer = integrations.assistant.answer(&request.message).await;
    Json(AssistantReply { answer })
}
