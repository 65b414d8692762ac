use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::workflows::credit::catalog::CreditCatalog;
use crate::workflows::credit::submission::SubmissionRecord;

use super::domain::{
    ContactMessage, ContactReceipt, CreditRequest, EvaluationInquiry, EvaluationLead, RequestId,
    RequestStatus,
};
use super::repository::{
    Notification, NotificationError, NotificationPublisher, RepositoryError, RequestRepository,
};
use super::validation::{IntakeGuard, IntakeViolation};

/// Receives submitted requests and leads, stores requests and notifies the back office.
pub struct CreditRequestService<R, N> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    notifications: Arc<N>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

fn next_lead_id(prefix: &str) -> String {
    let id = LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

impl<R, N> CreditRequestService<R, N>
where
    R: RequestRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(catalog: CreditCatalog, repository: Arc<R>, notifications: Arc<N>) -> Self {
        Self {
            guard: Arc::new(IntakeGuard::new(catalog)),
            repository,
            notifications,
        }
    }

    pub fn catalog(&self) -> &CreditCatalog {
        self.guard.catalog()
    }

    /// Validate and store a request coming out of the wizard.
    pub fn submit(&self, record: SubmissionRecord) -> Result<CreditRequest, RequestServiceError> {
        let record = self.guard.check_submission(record)?;
        let now = Utc::now();
        let request = CreditRequest {
            id: next_request_id(),
            record,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            admin_notes: None,
        };

        let stored = self.repository.insert(request)?;

        let mut details = BTreeMap::new();
        details.insert("credit_type".to_string(), stored.record.credit_type.clone());
        details.insert(
            "company".to_string(),
            stored.record.company.company_name.clone(),
        );
        details.insert(
            "nominal_amount".to_string(),
            stored.record.evaluation.nominal_amount.to_string(),
        );
        details.insert(
            "net_amount".to_string(),
            stored.record.evaluation.net_amount.to_string(),
        );
        // Already stored: a notification failure must not fail the submission.
        if let Err(err) = self.notifications.publish(Notification {
            template: "request_received".to_string(),
            reference: stored.id.0.clone(),
            details,
        }) {
            warn!(request_id = %stored.id.0, error = %err, "request stored but back office not notified");
        }

        info!(
            request_id = %stored.id.0,
            credit_type = %stored.record.credit_type,
            documents = stored.record.documents.len(),
            "credit request received"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &RequestId) -> Result<CreditRequest, RequestServiceError> {
        let request = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(request)
    }

    pub fn list(&self, limit: usize) -> Result<Vec<CreditRequest>, RequestServiceError> {
        Ok(self.repository.list(limit)?)
    }

    /// Moves a request along its back-office lifecycle.
    pub fn update_status(
        &self,
        id: &RequestId,
        status: RequestStatus,
        admin_notes: Option<String>,
    ) -> Result<CreditRequest, RequestServiceError> {
        let mut request = self.get(id)?;
        if request.status.is_final() && request.status != status {
            return Err(RequestServiceError::FinalStatus {
                current: request.status,
            });
        }

        request.status = status;
        request.updated_at = Utc::now();
        if admin_notes.is_some() {
            request.admin_notes = admin_notes;
        }
        self.repository.update(request.clone())?;

        if status.is_final() {
            let mut details = BTreeMap::new();
            details.insert("status".to_string(), status.label().to_string());
            if let Err(err) = self.notifications.publish(Notification {
                template: format!("request_{}", status.label()),
                reference: request.id.0.clone(),
                details,
            }) {
                warn!(request_id = %request.id.0, error = %err, "status saved but back office not notified");
            }
        }

        Ok(request)
    }

    /// Price a free-evaluation request and pass it on to the sales team.
    pub fn register_evaluation(
        &self,
        inquiry: EvaluationInquiry,
    ) -> Result<EvaluationLead, RequestServiceError> {
        self.guard.check_inquiry(&inquiry)?;
        let evaluation = self
            .guard
            .calculator()
            .evaluate_strict(&inquiry.credit_type, inquiry.amount)
            .map_err(IntakeViolation::from)?;

        let lead = EvaluationLead {
            lead_id: next_lead_id("eval"),
            inquiry,
            evaluation,
            received_at: Utc::now(),
        };

        let mut details = BTreeMap::new();
        details.insert("email".to_string(), lead.inquiry.email.clone());
        details.insert("credit_type".to_string(), lead.inquiry.credit_type.clone());
        details.insert(
            "sale_value".to_string(),
            lead.evaluation.sale_value.to_string(),
        );
        if let Some(company) = &lead.inquiry.company_name {
            details.insert("company".to_string(), company.clone());
        }
        if let Some(phone) = &lead.inquiry.phone {
            details.insert("phone".to_string(), phone.clone());
        }
        self.notifications.publish(Notification {
            template: "evaluation_requested".to_string(),
            reference: lead.lead_id.clone(),
            details,
        })?;

        info!(lead_id = %lead.lead_id, credit_type = %lead.inquiry.credit_type, "evaluation requested");
        Ok(lead)
    }

    pub fn register_contact(
        &self,
        message: ContactMessage,
    ) -> Result<ContactReceipt, RequestServiceError> {
        self.guard.check_contact(&message)?;
        let receipt = ContactReceipt {
            lead_id: next_lead_id("contact"),
            received_at: Utc::now(),
        };

        let mut details = BTreeMap::new();
        details.insert("name".to_string(), message.name.trim().to_string());
        details.insert("email".to_string(), message.email.trim().to_string());
        details.insert("message".to_string(), message.message.trim().to_string());
        if let Some(phone) = message.phone.filter(|phone| !phone.trim().is_empty()) {
            details.insert("phone".to_string(), phone);
        }
        self.notifications.publish(Notification {
            template: "contact_received".to_string(),
            reference: receipt.lead_id.clone(),
            details,
        })?;

        Ok(receipt)
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum RequestServiceError {
    #[error(transparent)]
    Validation(#[from] IntakeViolation),
    #[error("request is already {} and cannot change status", .current.label())]
    FinalStatus { current: RequestStatus },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
