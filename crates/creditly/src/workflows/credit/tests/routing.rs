use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::credit::intake::router::submit_handler;
use crate::workflows::credit::intake::{intake_router, CreditRequestService};

fn router() -> axum::Router {
    let (service, _, _) = build_service();
    intake_router(Arc::new(service))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(payload).expect("payload serialises"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn credits_route_lists_catalog_with_rates() {
    let response = router()
        .oneshot(get("/api/v1/credits"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let credits = payload.as_array().expect("array payload");
    assert_eq!(credits.len(), 5);
    assert_eq!(credits[0]["id"], "superbonus");
    assert_eq!(credits[0]["commissionRate"], 13);
    assert_eq!(credits[0]["icon"], "home");
    assert_eq!(credits[0]["documents"].as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn credit_detail_returns_not_found_for_unknown_id() {
    let response = router()
        .oneshot(get("/api/v1/credits/bonus-mobili"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("bonus-mobili"));
}

#[tokio::test]
async fn credit_documents_route_returns_checklist() {
    let response = router()
        .oneshot(get("/api/v1/credits/credito-iva/documents"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let documents = payload.as_array().expect("array payload");
    assert_eq!(documents.len(), 5);
    assert_eq!(documents[2]["category"], "tax");
    assert_eq!(documents[2]["display_name"], "Dichiarazione IVA");
}

#[tokio::test]
async fn evaluation_route_prices_the_lead() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/evaluations",
            &json!({
                "creditType": "superbonus",
                "amount": 100000.0,
                "email": "info@condominio.it"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["evaluation"]["saleValue"], 70000.0);
    assert_eq!(payload["evaluation"]["netAmount"], 57000.0);
}

#[tokio::test]
async fn evaluation_route_rejects_non_positive_amount() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/evaluations",
            &json!({
                "creditType": "superbonus",
                "amount": 0.0,
                "email": "info@condominio.it"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_route_accepts_complete_record_and_exposes_status() {
    let (service, _, _) = build_service();
    let app = intake_router(Arc::new(service));
    let record = serde_json::to_value(submission_record()).expect("record serialises");

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/requests", &record))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let receipt = read_json_body(response).await;
    assert_eq!(receipt["status"], "pending");
    let request_id = receipt["request_id"]
        .as_str()
        .expect("request id")
        .to_string();

    let response = app
        .oneshot(get(&format!("/api/v1/requests/{request_id}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let status = read_json_body(response).await;
    assert_eq!(status["status"], "pending");
    assert_eq!(status["company_name"], "Edil Rossi S.r.l.");
    assert_eq!(status["document_count"], 7);
    assert!(status.get("signature").is_none());
}

#[tokio::test]
async fn submit_handler_returns_unprocessable_for_missing_consent() {
    let (service, _, _) = build_service();
    let mut record = submission_record();
    record.consents.privacy = false;

    let response = submit_handler::<MemoryRepository, MemoryNotifications>(
        State(Arc::new(service)),
        axum::Json(record),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate() {
    let service = Arc::new(CreditRequestService::new(
        catalog(),
        Arc::new(ConflictRepository),
        Arc::new(MemoryNotifications::default()),
    ));

    let response = submit_handler::<ConflictRepository, MemoryNotifications>(
        State(service),
        axum::Json(submission_record()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(CreditRequestService::new(
        catalog(),
        Arc::new(UnavailableRepository),
        Arc::new(MemoryNotifications::default()),
    ));

    let response = submit_handler::<UnavailableRepository, MemoryNotifications>(
        State(service),
        axum::Json(submission_record()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload.get("error").is_some());
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_request() {
    let response = router()
        .oneshot(get("/api/v1/requests/req-999999"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_route_validates_email() {
    let response = router()
        .oneshot(post_json(
            "/api/v1/contact",
            &json!({
                "name": "Luca Verdi",
                "email": "luca.verdi",
                "message": "Richiamatemi"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router()
        .oneshot(post_json(
            "/api/v1/contact",
            &json!({
                "name": "Luca Verdi",
                "email": "luca@verdi.it",
                "message": "Richiamatemi"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
