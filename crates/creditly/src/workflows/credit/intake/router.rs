use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::workflows::credit::catalog::{CreditCatalog, CreditType, RequiredDocumentSpec};
use crate::workflows::credit::submission::SubmissionRecord;

use super::domain::{ContactMessage, EvaluationInquiry, RequestId};
use super::repository::{NotificationPublisher, RepositoryError, RequestRepository};
use super::service::{CreditRequestService, RequestServiceError};
use super::validation::IntakeViolation;
use crate::workflows::credit::valuation::ValuationError;

/// Catalog entry enriched with its pricing and checklist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTypeView {
    #[serde(flatten)]
    pub credit: CreditType,
    pub commission_rate: Option<u8>,
    pub documents: Vec<RequiredDocumentSpec>,
    pub intervention_types: &'static [&'static str],
}

impl CreditTypeView {
    pub fn from_catalog(catalog: &CreditCatalog, credit: &CreditType) -> Self {
        Self {
            credit: credit.clone(),
            commission_rate: catalog.commission_rate(credit.id),
            documents: catalog.required_documents(credit.id),
            intervention_types: catalog.intervention_types(credit.id),
        }
    }
}

/// Router builder exposing the catalog, evaluation and request intake endpoints.
pub fn intake_router<R, N>(service: Arc<CreditRequestService<R, N>>) -> Router
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/credits", get(list_credits_handler::<R, N>))
        .route(
            "/api/v1/credits/:credit_id",
            get(credit_detail_handler::<R, N>),
        )
        .route(
            "/api/v1/credits/:credit_id/documents",
            get(credit_documents_handler::<R, N>),
        )
        .route("/api/v1/evaluations", post(evaluation_handler::<R, N>))
        .route("/api/v1/requests", post(submit_handler::<R, N>))
        .route(
            "/api/v1/requests/:request_id",
            get(status_handler::<R, N>),
        )
        .route("/api/v1/contact", post(contact_handler::<R, N>))
        .with_state(service)
}

pub(crate) async fn list_credits_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let catalog = service.catalog();
    let credits: Vec<_> = catalog
        .all()
        .iter()
        .map(|credit| CreditTypeView::from_catalog(catalog, credit))
        .collect();
    (StatusCode::OK, axum::Json(credits)).into_response()
}

pub(crate) async fn credit_detail_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    Path(credit_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let catalog = service.catalog();
    match catalog.get(&credit_id) {
        Ok(credit) => (
            StatusCode::OK,
            axum::Json(CreditTypeView::from_catalog(catalog, credit)),
        )
            .into_response(),
        Err(err) => error_response(StatusCode::NOT_FOUND, err.to_string()),
    }
}

pub(crate) async fn credit_documents_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    Path(credit_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let catalog = service.catalog();
    if let Err(err) = catalog.get(&credit_id) {
        return error_response(StatusCode::NOT_FOUND, err.to_string());
    }
    (
        StatusCode::OK,
        axum::Json(catalog.required_documents(&credit_id)),
    )
        .into_response()
}

pub(crate) async fn evaluation_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    axum::Json(inquiry): axum::Json<EvaluationInquiry>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register_evaluation(inquiry) {
        Ok(lead) => (StatusCode::ACCEPTED, axum::Json(lead)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    axum::Json(record): axum::Json<SubmissionRecord>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.submit(record) {
        Ok(request) => (StatusCode::ACCEPTED, axum::Json(request.receipt())).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn status_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&RequestId(request_id)) {
        Ok(request) => (StatusCode::OK, axum::Json(request.status_view())).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn contact_handler<R, N>(
    State(service): State<Arc<CreditRequestService<R, N>>>,
    axum::Json(message): axum::Json<ContactMessage>,
) -> Response
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.register_contact(message) {
        Ok(receipt) => (StatusCode::ACCEPTED, axum::Json(receipt)).into_response(),
        Err(err) => service_error_response(err),
    }
}

fn service_error_response(err: RequestServiceError) -> Response {
    let status = match &err {
        RequestServiceError::Validation(IntakeViolation::Valuation(
            ValuationError::UnknownCredit(_),
        )) => StatusCode::NOT_FOUND,
        RequestServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RequestServiceError::FinalStatus { .. } => StatusCode::CONFLICT,
        RequestServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RequestServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RequestServiceError::Repository(RepositoryError::Unavailable(_))
        | RequestServiceError::Notification(_) => {
            warn!(error = %err, "intake backend failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
