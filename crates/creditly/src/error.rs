use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::credit::catalog::CatalogError;
use crate::workflows::credit::drafts::DraftStoreError;
use crate::workflows::credit::submission::SubmissionError;
use crate::workflows::credit::valuation::ValuationError;
use crate::workflows::credit::wizard::WizardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    NotFound(CatalogError),
    Valuation(ValuationError),
    Wizard(WizardError),
    Submission(SubmissionError),
    Drafts(DraftStoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::NotFound(err) => write!(f, "{}", err),
            AppError::Valuation(err) => write!(f, "valuation error: {}", err),
            AppError::Wizard(err) => write!(f, "request error: {}", err),
            AppError::Submission(err) => write!(f, "submission error: {}", err),
            AppError::Drafts(err) => write!(f, "draft storage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::NotFound(err) => Some(err),
            AppError::Valuation(err) => Some(err),
            AppError::Wizard(err) => Some(err),
            AppError::Submission(err) => Some(err),
            AppError::Drafts(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::Valuation(ValuationError::UnknownCredit(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Valuation(_) | AppError::Wizard(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Submission(err) if err.is_retryable() => StatusCode::BAD_GATEWAY,
            AppError::Submission(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Drafts(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::NotFound(value)
    }
}

impl From<ValuationError> for AppError {
    fn from(value: ValuationError) -> Self {
        Self::Valuation(value)
    }
}

impl From<WizardError> for AppError {
    fn from(value: WizardError) -> Self {
        Self::Wizard(value)
    }
}

impl From<SubmissionError> for AppError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

impl From<DraftStoreError> for AppError {
    fn from(value: DraftStoreError) -> Self {
        Self::Drafts(value)
    }
}
