use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::credit::catalog::{CreditCatalog, DocumentCategory};
use crate::workflows::credit::consent::ConsentKey;
use crate::workflows::credit::documents::DocumentArtifact;
use crate::workflows::credit::domain::{CompanyFields, SessionContext};
use crate::workflows::credit::intake::domain::{CreditRequest, RequestId};
use crate::workflows::credit::intake::repository::{
    Notification, NotificationError, NotificationPublisher, RepositoryError, RequestRepository,
};
use crate::workflows::credit::intake::service::CreditRequestService;
use crate::workflows::credit::submission::{
    RequestSubmitter, SubmissionError, SubmissionReceipt, SubmissionRecord,
};
use crate::workflows::credit::wizard::{RequestWizard, WizardStep};

pub(super) fn catalog() -> CreditCatalog {
    CreditCatalog::standard()
}

pub(super) fn company() -> CompanyFields {
    CompanyFields {
        company_name: "Edil Rossi S.r.l.".to_string(),
        vat_number: "IT01234567890".to_string(),
        fiscal_code: "01234567890".to_string(),
        legal_representative: "Mario Rossi".to_string(),
        email: "mario.rossi@edilrossi.it".to_string(),
        phone: "+39 02 1234567".to_string(),
    }
}

pub(super) fn pdf(name: &str) -> DocumentArtifact {
    DocumentArtifact {
        name: format!("{name}.pdf"),
        uri: format!("file:///uploads/{name}.pdf"),
        mime_type: Some("application/pdf".to_string()),
        size_bytes: 48_213,
    }
}

pub(super) fn open_wizard(credit_id: &str) -> RequestWizard {
    RequestWizard::open(&catalog(), credit_id, SessionContext::anonymous("sess-001"))
        .expect("credit type exists")
}

/// Step one filled in with a valid company and amount.
pub(super) fn filled_wizard(credit_id: &str) -> RequestWizard {
    let mut wizard = open_wizard(credit_id);
    wizard.set_company(company());
    wizard.set_amount("100000");
    wizard.set_description("Cappotto termico condominio via Roma 12");
    wizard
}

pub(super) fn upload_required(wizard: &mut RequestWizard) {
    let categories: Vec<DocumentCategory> = wizard
        .checklist()
        .requirements()
        .iter()
        .filter(|spec| spec.required)
        .map(|spec| spec.category)
        .collect();
    for category in categories {
        wizard
            .upload_document(category, pdf(category.key()))
            .expect("upload accepted");
    }
}

pub(super) fn grant_mandatory_consents(wizard: &mut RequestWizard) {
    wizard.set_consent(ConsentKey::Privacy, true);
    wizard.set_consent(ConsentKey::AntiMoney, true);
}

/// Wizard sitting on the signature step with every guard satisfied.
pub(super) fn completed_wizard(credit_id: &str) -> RequestWizard {
    let mut wizard = filled_wizard(credit_id);
    wizard.next().expect("data entry complete");
    upload_required(&mut wizard);
    wizard.next().expect("documents complete");
    grant_mandatory_consents(&mut wizard);
    wizard.next().expect("consents granted");
    wizard.sign("data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(wizard.step(), WizardStep::Signature);
    wizard
}

pub(super) fn submission_record() -> SubmissionRecord {
    completed_wizard("superbonus")
        .to_submission()
        .expect("complete wizard builds a record")
}

pub(super) fn build_service() -> (
    CreditRequestService<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service =
        CreditRequestService::new(catalog(), repository.clone(), notifications.clone());
    (service, repository, notifications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<RequestId, CreditRequest>>>,
}

impl RequestRepository for MemoryRepository {
    fn insert(&self, request: CreditRequest) -> Result<CreditRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update(&self, request: CreditRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(request.id.clone(), request);
        Ok(())
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<CreditRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, limit: usize) -> Result<Vec<CreditRequest>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut requests: Vec<_> = guard.values().cloned().collect();
        requests.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        requests.truncate(limit);
        Ok(requests)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct OfflineNotifications;

impl NotificationPublisher for OfflineNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct ConflictRepository;

impl RequestRepository for ConflictRepository {
    fn insert(&self, _request: CreditRequest) -> Result<CreditRequest, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _request: CreditRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<CreditRequest>, RepositoryError> {
        Ok(None)
    }

    fn list(&self, _limit: usize) -> Result<Vec<CreditRequest>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) struct UnavailableRepository;

impl RequestRepository for UnavailableRepository {
    fn insert(&self, _request: CreditRequest) -> Result<CreditRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _request: CreditRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<CreditRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<CreditRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// How a [`ScriptedSubmitter`] answers.
#[derive(Debug, Clone)]
pub(super) enum SubmitterScript {
    Accept,
    Reject(u16),
    Unavailable,
    Stall(Duration),
}

pub(super) struct ScriptedSubmitter {
    script: SubmitterScript,
    received: Mutex<Vec<SubmissionRecord>>,
}

impl ScriptedSubmitter {
    pub(super) fn new(script: SubmitterScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            received: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn received(&self) -> Vec<SubmissionRecord> {
        self.received
            .lock()
            .expect("submitter mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl RequestSubmitter for ScriptedSubmitter {
    async fn submit(
        &self,
        record: &SubmissionRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.received
            .lock()
            .expect("submitter mutex poisoned")
            .push(record.clone());

        match &self.script {
            SubmitterScript::Accept => Ok(SubmissionReceipt {
                request_id: "req-test".to_string(),
                status: "pending".to_string(),
                received_at: Utc::now(),
            }),
            SubmitterScript::Reject(status) => Err(SubmissionError::Rejected {
                status: *status,
                message: "invalid record".to_string(),
            }),
            SubmitterScript::Unavailable => {
                Err(SubmissionError::Retryable("503 Service Unavailable".to_string()))
            }
            SubmitterScript::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(SubmissionReceipt {
                    request_id: "req-late".to_string(),
                    status: "pending".to_string(),
                    received_at: Utc::now(),
                })
            }
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
