use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::consent::{ConsentChange, ConsentSet};
use super::documents::UploadedDocument;
use super::domain::{CompanyFields, Signature};
use super::drafts::{DraftSnapshot, DraftStore};
use super::valuation::{EvaluationResult, Money};

pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Composite record handed over once the wizard completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub session_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub credit_type: String,
    pub company: CompanyFields,
    pub amount: Money,
    pub evaluation: EvaluationResult,
    #[serde(default)]
    pub intervention_type: Option<String>,
    #[serde(default)]
    pub description: String,
    pub documents: Vec<UploadedDocument>,
    pub consents: ConsentSet,
    #[serde(default)]
    pub consent_trail: Vec<ConsentChange>,
    pub signature: Signature,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub request_id: String,
    pub status: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
    #[error("submission failed, retry later: {0}")]
    Retryable(String),
    #[error("submission rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl SubmissionError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SubmissionError::Rejected { .. })
    }
}

/// Outbound collaborator that persists and notifies about a submitted request.
#[async_trait]
pub trait RequestSubmitter: Send + Sync {
    async fn submit(&self, record: &SubmissionRecord)
        -> Result<SubmissionReceipt, SubmissionError>;
}

/// Posts records as JSON to the intake endpoint.
#[derive(Debug, Clone)]
pub struct HttpRequestSubmitter {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpRequestSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmissionError::Retryable(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl RequestSubmitter for HttpRequestSubmitter {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|err| classify_transport_error(err, self.timeout))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<SubmissionReceipt>()
                .await
                .map_err(|err| SubmissionError::Retryable(format!("unreadable receipt: {err}")));
        }

        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, message))
    }
}

fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::Timeout(timeout)
    } else {
        SubmissionError::Retryable(err.to_string())
    }
}

pub(crate) fn classify_status(status: StatusCode, message: String) -> SubmissionError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        SubmissionError::Retryable(format!("{status}: {message}"))
    } else {
        SubmissionError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Sends records through a submitter, keeping the draft on disk until one goes through.
pub struct SubmissionBoundary<S: ?Sized, D: ?Sized> {
    submitter: Arc<S>,
    drafts: Arc<D>,
    timeout: Duration,
}

impl<S, D> SubmissionBoundary<S, D>
where
    S: RequestSubmitter + ?Sized,
    D: DraftStore + ?Sized,
{
    pub fn new(submitter: Arc<S>, drafts: Arc<D>) -> Self {
        Self {
            submitter,
            drafts,
            timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn drafts(&self) -> &D {
        &self.drafts
    }

    pub async fn submit(
        &self,
        record: &SubmissionRecord,
        snapshot: &DraftSnapshot,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let outcome = match tokio::time::timeout(self.timeout, self.submitter.submit(record)).await
        {
            Ok(result) => result,
            Err(_) => Err(SubmissionError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(receipt) => {
                if let Err(err) = self.drafts.delete(&record.session_id) {
                    warn!(session = %record.session_id, error = %err, "failed to clear cached draft");
                }
                Ok(receipt)
            }
            Err(err) => {
                warn!(
                    session = %record.session_id,
                    retryable = err.is_retryable(),
                    error = %err,
                    "credit request submission failed, keeping draft"
                );
                if let Err(store_err) = self.drafts.save(&record.session_id, snapshot) {
                    error!(session = %record.session_id, error = %store_err, "failed to cache draft");
                }
                Err(err)
            }
        }
    }
}
