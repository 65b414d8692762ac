use crate::infra::AppState;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::Utc;
use creditly::chat::{chat_router, ChatRelay};
use creditly::workflows::credit::intake::{
    intake_router, CreditRequestService, CreditTypeView, NotificationPublisher, RequestRepository,
};
use creditly::workflows::credit::{ValuationCalculator, ValuationError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub(crate) fn with_service_routes<R, N>(
    service: Arc<CreditRequestService<R, N>>,
    chat: Arc<ChatRelay>,
) -> axum::Router
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    intake_router(service)
        .merge(chat_router(chat))
        .route("/", axum::routing::get(root_endpoint))
        .route("/config", axum::routing::get(config_endpoint))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/trpc/:procedure",
            axum::routing::get(rpc_query_endpoint).post(rpc_mutation_endpoint),
        )
}

pub(crate) async fn root_endpoint(Extension(state): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": format!("{} API is running", state.brand.name),
        "domain": state.brand.domain,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn config_endpoint(Extension(state): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "brand": state.brand.name,
        "domain": state.brand.domain,
        "baseUrl": state.brand.base_url,
        "environment": state.environment.label(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub(crate) async fn healthcheck() -> Json<Value> {
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditLookup {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateInput {
    credit_type: String,
    amount: f64,
}

/// RPC failure rendered as `{ "error": message }`.
struct RpcError {
    status: StatusCode,
    message: String,
}

impl RpcError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_input(err: serde_json::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("invalid input: {err}"))
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// `GET /trpc/:procedure?input=<json>`.
pub(crate) async fn rpc_query_endpoint(
    Extension(state): Extension<AppState>,
    Path(procedure): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let input = match params.get("input") {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => return RpcError::bad_input(err).into_response(),
        },
        None => Value::Null,
    };
    rpc_response(dispatch(&state, &procedure, input))
}

pub(crate) async fn rpc_mutation_endpoint(
    Extension(state): Extension<AppState>,
    Path(procedure): Path<String>,
    body: Option<Json<Value>>,
) -> Response {
    let input = body.map(|Json(value)| value).unwrap_or(Value::Null);
    rpc_response(dispatch(&state, &procedure, input))
}

fn rpc_response(result: Result<Value, RpcError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(json!({ "result": { "data": data } }))).into_response(),
        Err(err) => err.into_response(),
    }
}

fn dispatch(state: &AppState, procedure: &str, input: Value) -> Result<Value, RpcError> {
    debug!(procedure, "rpc call");
    let catalog = state.catalog.as_ref();
    let data = match procedure {
        "credits.list" => {
            let credits: Vec<_> = catalog
                .all()
                .iter()
                .map(|credit| CreditTypeView::from_catalog(catalog, credit))
                .collect();
            to_data(&credits)?
        }
        "credits.get" => {
            let lookup: CreditLookup =
                serde_json::from_value(input).map_err(RpcError::bad_input)?;
            let credit = catalog
                .get(&lookup.id)
                .map_err(|err| RpcError::new(StatusCode::NOT_FOUND, err.to_string()))?;
            to_data(&CreditTypeView::from_catalog(catalog, credit))?
        }
        "evaluation.estimate" => {
            let estimate: EstimateInput =
                serde_json::from_value(input).map_err(RpcError::bad_input)?;
            let result = ValuationCalculator::new(catalog.clone())
                .evaluate_strict(&estimate.credit_type, estimate.amount)
                .map_err(|err| {
                    let status = match &err {
                        ValuationError::UnknownCredit(_) => StatusCode::NOT_FOUND,
                        ValuationError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    };
                    RpcError::new(status, err.to_string())
                })?;
            to_data(&result)?
        }
        other => {
            return Err(RpcError::new(
                StatusCode::NOT_FOUND,
                format!("no procedure named '{other}'"),
            ))
        }
    };
    Ok(data)
}

fn to_data<T: serde::Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|err| RpcError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}
