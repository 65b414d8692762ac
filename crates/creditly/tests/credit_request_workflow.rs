//! End-to-end scenarios for the credit request flow: the wizard feeds the submission
//! boundary, which hands records to the intake service behind the public HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use creditly::workflows::credit::intake::{
        CreditRequest, CreditRequestService, Notification, NotificationError,
        NotificationPublisher, RepositoryError, RequestId, RequestRepository,
    };
    use creditly::workflows::credit::{
        CompanyFields, ConsentKey, CreditCatalog, DocumentArtifact, RequestSubmitter,
        RequestWizard, SessionContext, SubmissionError, SubmissionReceipt, SubmissionRecord,
    };

    #[derive(Default)]
    pub struct MemoryRepository {
        records: Mutex<HashMap<RequestId, CreditRequest>>,
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
            self.records
                .lock()
                .expect("repository mutex poisoned")
                .insert(request.id.clone(), request);
            Ok(())
        }

        fn fetch(&self, id: &RequestId) -> Result<Option<CreditRequest>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned())
        }

        fn list(&self, limit: usize) -> Result<Vec<CreditRequest>, RepositoryError> {
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard.values().take(limit).cloned().collect())
        }
    }

    #[derive(Default)]
    pub struct MemoryNotifications {
        events: Mutex<Vec<Notification>>,
    }

    impl MemoryNotifications {
        pub fn templates(&self) -> Vec<String> {
            self.events
                .lock()
                .expect("notification mutex poisoned")
                .iter()
                .map(|event| event.template.clone())
                .collect()
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

    pub type Service = CreditRequestService<MemoryRepository, MemoryNotifications>;

    /// Forwards records straight into the intake service, optionally failing once first.
    pub struct InProcessSubmitter {
        pub service: Arc<Service>,
        pub fail_next: AtomicBool,
    }

    #[async_trait]
    impl RequestSubmitter for InProcessSubmitter {
        async fn submit(
            &self,
            record: &SubmissionRecord,
        ) -> Result<SubmissionReceipt, SubmissionError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(SubmissionError::Retryable("connection reset".to_string()));
            }
            self.service
                .submit(record.clone())
                .map(|request| request.receipt())
                .map_err(|err| SubmissionError::Rejected {
                    status: 422,
                    message: err.to_string(),
                })
        }
    }

    pub fn build() -> (Arc<Service>, Arc<MemoryNotifications>) {
        let notifications = Arc::new(MemoryNotifications::default());
        let service = Arc::new(CreditRequestService::new(
            CreditCatalog::standard(),
            Arc::new(MemoryRepository::default()),
            notifications.clone(),
        ));
        (service, notifications)
    }

    pub fn pdf(name: &str) -> DocumentArtifact {
        DocumentArtifact {
            name: format!("{name}.pdf"),
            uri: format!("file:///uploads/{name}.pdf"),
            mime_type: Some("application/pdf".to_string()),
            size_bytes: 10_240,
        }
    }

    pub fn completed_wizard(session_id: &str) -> RequestWizard {
        let catalog = CreditCatalog::standard();
        let mut wizard =
            RequestWizard::open(&catalog, "credito-pa", SessionContext::anonymous(session_id))
                .expect("credit exists");

        wizard.set_company(CompanyFields {
            company_name: "Servizi Comunali S.r.l.".to_string(),
            vat_number: "IT09876543210".to_string(),
            fiscal_code: "09876543210".to_string(),
            legal_representative: "Anna Neri".to_string(),
            email: "amministrazione@servizicomunali.it".to_string(),
            phone: "+39 06 7654321".to_string(),
        });
        wizard.set_amount("€ 250.000,00");
        wizard.next().expect("data entry complete");

        let categories: Vec<_> = wizard
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
        wizard.next().expect("documents complete");

        wizard.set_consent(ConsentKey::Privacy, true);
        wizard.set_consent(ConsentKey::AntiMoney, true);
        wizard.set_consent(ConsentKey::Terms, true);
        wizard.next().expect("consents granted");

        wizard.sign("data:image/png;base64,c2lnbmF0dXJl");
        wizard
    }
}

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use creditly::workflows::credit::intake::{intake_router, RequestId, RequestStatus};
use creditly::workflows::credit::{
    CreditCatalog, DraftStore, FileDraftStore, RequestWizard, SessionContext,
    SubmissionBoundary, WizardError, WizardStep,
};

use common::*;

#[tokio::test]
async fn wizard_submission_lands_in_intake_and_is_visible_over_http() {
    let (service, notifications) = build();
    let submitter = Arc::new(InProcessSubmitter {
        service: service.clone(),
        fail_next: AtomicBool::new(false),
    });
    let drafts_dir = std::env::temp_dir().join(format!("creditly-it-{}", uuid::Uuid::new_v4()));
    let drafts = Arc::new(FileDraftStore::new(&drafts_dir));
    let boundary = SubmissionBoundary::new(submitter, drafts.clone());

    let receipt = completed_wizard("sess-http")
        .submit(&boundary)
        .await
        .expect("submission accepted");
    assert_eq!(receipt.status, "pending");
    assert!(drafts.load("sess-http").expect("readable").is_none());

    let stored = service
        .get(&RequestId(receipt.request_id.clone()))
        .expect("request stored");
    assert_eq!(stored.record.evaluation.commission_rate, 22);
    assert_eq!(stored.record.evaluation.sale_value.cents(), 17_500_000);
    assert_eq!(stored.record.evaluation.net_amount.cents(), 12_000_000);
    assert_eq!(notifications.templates(), vec!["request_received"]);

    let response = intake_router(service.clone())
        .oneshot(
            Request::get(format!("/api/v1/requests/{}", receipt.request_id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    service
        .update_status(&stored.id, RequestStatus::Approved, None)
        .expect("approval recorded");
    assert_eq!(
        notifications.templates(),
        vec!["request_received", "request_approved"]
    );

    let _ = std::fs::remove_dir_all(&drafts_dir);
}

#[tokio::test]
async fn failed_submission_can_be_resumed_from_the_draft_store() {
    let (service, _) = build();
    let submitter = Arc::new(InProcessSubmitter {
        service: service.clone(),
        fail_next: AtomicBool::new(true),
    });
    let drafts_dir = std::env::temp_dir().join(format!("creditly-it-{}", uuid::Uuid::new_v4()));
    let drafts = Arc::new(FileDraftStore::new(&drafts_dir));
    let boundary = SubmissionBoundary::new(submitter, drafts.clone());

    let failure = completed_wizard("sess-retry")
        .submit(&boundary)
        .await
        .expect_err("first attempt fails");
    assert!(matches!(failure.error, WizardError::Submission(_)));

    let snapshot = drafts
        .load("sess-retry")
        .expect("readable")
        .expect("draft cached after failure");
    assert_eq!(snapshot.step, WizardStep::Signature);

    let resumed = RequestWizard::resume(
        &CreditCatalog::standard(),
        SessionContext::anonymous("sess-retry"),
        snapshot,
    )
    .expect("draft resumes");
    let receipt = resumed.submit(&boundary).await.expect("retry succeeds");

    assert!(receipt.request_id.starts_with("req-"));
    assert!(drafts.load("sess-retry").expect("readable").is_none());
    assert_eq!(service.list(10).expect("listing").len(), 1);

    let _ = std::fs::remove_dir_all(&drafts_dir);
}
