use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::proposals::router::submit_handler;
use crate::proposals::ProposalService;
use crate::stores::MemoryStore;

fn json_request(method: &str, uri: &str, payload: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(payload).expect("encode payload")))
        .expect("request")
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn submission_payload() -> Value {
    serde_json::to_value(submission(dec!(300), 3)).expect("serialize submission")
}

async fn submit_through(router: &axum::Router) -> Value {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/proposals",
            &submission_payload(),
            None,
        ))
        .await
        .expect("submit response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    read_json_body(response).await
}

#[tokio::test]
async fn pricing_route_lists_every_tier() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request("GET", "/api/v1/pricing", None))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    let tiers = body.as_array().expect("tier list");
    assert_eq!(tiers.len(), 5);
}

#[tokio::test]
async fn quote_route_returns_table_terms() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/quote?principal=300&installments=3",
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["per_installment_payment"], json!(159.6));
    assert_eq!(body["total_payable"], json!(478.8));
    assert_eq!(
        body["total_in_words"],
        json!("quatrocentos e setenta e oito reais e oitenta centavos")
    );
    assert_eq!(body["due_dates"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn quote_route_rejects_unknown_principal() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/quote?principal=250&installments=3",
            None,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_route_accepts_payloads() {
    let (service, cache, _) = local_only_service();
    let router = router_with_service(service);

    let body = submit_through(&router).await;
    assert_eq!(body["status"], json!("pending"));
    assert_eq!(body["status_label"], json!("Em Análise"));
    assert_eq!(body["applicant_name"], json!("Maria da Silva"));
    assert!(body.get("tax_id").is_none());

    let stored = crate::proposals::RecordStore::list(&cache)
        .await
        .expect("cache");
    assert_eq!(stored.len(), 1);
    assert_eq!(body["id"], json!(stored[0].id.as_str()));
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate() {
    let service = Arc::new(ProposalService::<ConflictStore, MemoryStore, _>::new(
        Arc::new(ConflictStore),
        None,
        Arc::new(RecordingNotifier::default()),
        authenticator(),
        assembler(),
    ));

    let response = submit_handler::<ConflictStore, MemoryStore, RecordingNotifier>(
        State(service),
        axum::Json(submission(dec!(300), 3)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_unavailable_when_no_store_answers() {
    let service = Arc::new(ProposalService::new(
        Arc::new(UnavailableStore),
        Some(Arc::new(UnavailableStore)),
        Arc::new(RecordingNotifier::default()),
        authenticator(),
        assembler(),
    ));

    let response = submit_handler::<UnavailableStore, UnavailableStore, RecordingNotifier>(
        State(service),
        axum::Json(submission(dec!(300), 3)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn staff_listing_requires_bearer_token() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    submit_through(&router).await;

    let anonymous = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/proposals", None))
        .await
        .expect("response");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let wrong = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/proposals", Some("nope")))
        .await
        .expect("response");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let staff = router
        .oneshot(empty_request("GET", "/api/v1/proposals", Some(STAFF_TOKEN)))
        .await
        .expect("response");
    assert_eq!(staff.status(), StatusCode::OK);
    let body = read_json_body(staff).await;
    let records = body.as_array().expect("record list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["tax_id"], json!("123.456.789-01"));
}

#[tokio::test]
async fn status_route_accepts_portuguese_labels_and_guards_terminal_states() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    let submitted = submit_through(&router).await;
    let id = submitted["id"].as_str().expect("id").to_string();
    let uri = format!("/api/v1/proposals/{id}/status");

    let approved = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &uri,
            &json!({ "status": "Aprovado" }),
            Some(STAFF_TOKEN),
        ))
        .await
        .expect("response");
    assert_eq!(approved.status(), StatusCode::OK);
    assert_eq!(read_json_body(approved).await["status"], json!("approved"));

    let reversed = router
        .oneshot(json_request(
            "PUT",
            &uri,
            &json!({ "status": "rejected" }),
            Some(STAFF_TOKEN),
        ))
        .await
        .expect("response");
    assert_eq!(reversed.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_route_removes_records() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    let submitted = submit_through(&router).await;
    let uri = format!(
        "/api/v1/proposals/{}",
        submitted["id"].as_str().expect("id")
    );

    let deleted = router
        .clone()
        .oneshot(empty_request("DELETE", &uri, Some(STAFF_TOKEN)))
        .await
        .expect("response");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let again = router
        .oneshot(empty_request("DELETE", &uri, Some(STAFF_TOKEN)))
        .await
        .expect("response");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contract_route_serves_plain_text() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    let submitted = submit_through(&router).await;
    let uri = format!(
        "/api/v1/proposals/{}/contract",
        submitted["id"].as_str().expect("id")
    );

    let response = router
        .oneshot(empty_request("GET", &uri, Some(STAFF_TOKEN)))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("text/plain")));

    let text = read_text_body(response).await;
    assert!(text.contains("R$ 478,80"));
    assert!(text.contains("Maria da Silva"));
}

#[tokio::test]
async fn lookup_route_returns_summaries_only() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    submit_through(&router).await;

    let found = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/proposals/lookup",
            &json!({ "tax_id": "123.456.789-01", "birth_date": "1990-05-17" }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(found.status(), StatusCode::OK);
    let body = read_json_body(found).await;
    let proposals = body["proposals"].as_array().expect("proposal list");
    assert_eq!(proposals.len(), 1);
    assert!(proposals[0].get("whatsapp").is_none());
    assert_eq!(
        proposals[0]["status_message"],
        json!("Estamos analisando seus documentos. Prazo de até 48h.")
    );

    let none = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/proposals/lookup",
            &json!({ "tax_id": "000.000.000-00", "birth_date": "1990-05-17" }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(none.status(), StatusCode::OK);
    assert_eq!(read_json_body(none).await["proposals"], json!([]));

    let malformed = router
        .oneshot(json_request(
            "POST",
            "/api/v1/proposals/lookup",
            &json!({ "tax_id": "12345678901", "birth_date": "17/05/1990" }),
            None,
        ))
        .await
        .expect("response");
    assert_eq!(malformed.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_route_serves_csv_to_staff() {
    let (service, _, _) = local_only_service();
    let router = router_with_service(service);
    submit_through(&router).await;

    let anonymous = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/proposals/export", None))
        .await
        .expect("response");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(empty_request(
            "GET",
            "/api/v1/proposals/export",
            Some(STAFF_TOKEN),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let text = read_text_body(response).await;
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("Maria da Silva"));
}
