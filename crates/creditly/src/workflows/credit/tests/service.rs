use std::sync::Arc;

use super::common::*;
use crate::workflows::credit::catalog::{CatalogError, DocumentCategory};
use crate::workflows::credit::consent::ConsentKey;
use crate::workflows::credit::domain::CompanyFields;
use crate::workflows::credit::intake::domain::{
    ContactMessage, EvaluationInquiry, RequestId, RequestStatus,
};
use crate::workflows::credit::intake::repository::{RepositoryError, RequestRepository};
use crate::workflows::credit::intake::{
    CreditRequestService, IntakeViolation, RequestServiceError,
};
use crate::workflows::credit::valuation::{Money, ValuationError};

#[test]
fn submit_stores_pending_request_and_notifies() {
    let (service, repository, notifications) = build_service();

    let stored = service
        .submit(submission_record())
        .expect("complete record accepted");

    assert_eq!(stored.status, RequestStatus::Pending);
    assert!(stored.id.0.starts_with("req-"));
    let fetched = repository
        .fetch(&stored.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(fetched, stored);

    let events = notifications.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].template, "request_received");
    assert_eq!(events[0].reference, stored.id.0);
    assert_eq!(events[0].details["net_amount"], "57000.00");
}

#[test]
fn submit_recomputes_evaluation_server_side() {
    let (service, _, _) = build_service();
    let mut record = submission_record();
    record.evaluation.commission_rate = 1;
    record.evaluation.net_amount = Money::from_cents(9_999_999);

    let stored = service.submit(record).expect("record accepted");

    assert_eq!(stored.record.evaluation.commission_rate, 13);
    assert_eq!(stored.record.evaluation.net_amount, Money::from_cents(5_700_000));
}

#[test]
fn submit_rejects_missing_mandatory_consent() {
    let (service, _, notifications) = build_service();
    let mut record = submission_record();
    record.consents.anti_money = false;

    match service.submit(record) {
        Err(RequestServiceError::Validation(IntakeViolation::MissingConsent(
            ConsentKey::AntiMoney,
        ))) => {}
        other => panic!("expected missing consent, got {other:?}"),
    }
    assert!(notifications.events().is_empty());
}

#[test]
fn submit_rejects_incomplete_documents() {
    let (service, _, _) = build_service();
    let mut record = submission_record();
    record
        .documents
        .retain(|document| document.category != DocumentCategory::Energy);

    match service.submit(record) {
        Err(RequestServiceError::Validation(IntakeViolation::MissingDocuments(missing))) => {
            assert_eq!(missing, vec!["APE ante e post intervento".to_string()]);
        }
        other => panic!("expected missing documents, got {other:?}"),
    }
}

#[test]
fn submit_rejects_unknown_credit_blank_company_and_missing_signature() {
    let (service, _, _) = build_service();

    let mut unknown = submission_record();
    unknown.credit_type = "bonus-mobili".to_string();
    assert!(matches!(
        service.submit(unknown),
        Err(RequestServiceError::Validation(IntakeViolation::Valuation(
            ValuationError::UnknownCredit(CatalogError::NotFound(_))
        )))
    ));

    let mut nameless = submission_record();
    nameless.company.company_name = "  ".to_string();
    assert!(matches!(
        service.submit(nameless),
        Err(RequestServiceError::Validation(IntakeViolation::MissingField("company name")))
    ));

    let mut unsigned = submission_record();
    unsigned.signature.payload = String::new();
    assert!(matches!(
        service.submit(unsigned),
        Err(RequestServiceError::Validation(IntakeViolation::MissingSignature))
    ));
}

#[test]
fn submit_accepts_what_the_wizard_accepts() {
    let mut wizard = open_wizard("credito-iva");
    wizard.set_company(CompanyFields {
        company_name: "Ferramenta Bassi".to_string(),
        ..CompanyFields::default()
    });
    wizard.set_amount("15.000,00");
    wizard.next().expect("company name and amount are enough");
    upload_required(&mut wizard);
    wizard.next().expect("documents complete");
    grant_mandatory_consents(&mut wizard);
    wizard.next().expect("consents granted");
    wizard.sign("data:image/png;base64,iVBORw0KGgo=");
    let record = wizard.to_submission().expect("wizard accepts the draft");

    let (service, _, _) = build_service();
    let stored = service.submit(record).expect("intake accepts the same record");
    assert_eq!(stored.record.company.vat_number, "");
    assert_eq!(stored.record.evaluation.nominal_amount, Money::from_cents(1_500_000));
}

#[test]
fn notification_outage_does_not_fail_a_stored_request() {
    let repository = Arc::new(MemoryRepository::default());
    let service = CreditRequestService::new(
        catalog(),
        repository.clone(),
        Arc::new(OfflineNotifications),
    );

    let stored = service
        .submit(submission_record())
        .expect("stored request is reported as accepted");
    assert_eq!(repository.list(10).expect("listing").len(), 1);

    let approved = service
        .update_status(&stored.id, RequestStatus::Approved, None)
        .expect("status change is kept");
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(
        service.get(&stored.id).expect("still stored").status,
        RequestStatus::Approved
    );
}

#[test]
fn notification_outage_still_fails_leads() {
    let service = CreditRequestService::new(
        catalog(),
        Arc::new(MemoryRepository::default()),
        Arc::new(OfflineNotifications),
    );
    assert!(matches!(
        service.register_contact(ContactMessage {
            name: "Giulia Bianchi".to_string(),
            email: "giulia@bianchi.it".to_string(),
            phone: None,
            message: "Vorrei informazioni".to_string(),
        }),
        Err(RequestServiceError::Notification(_))
    ));
}

#[test]
fn submit_propagates_repository_conflicts() {
    let service = CreditRequestService::new(
        catalog(),
        Arc::new(ConflictRepository),
        Arc::new(MemoryNotifications::default()),
    );
    assert!(matches!(
        service.submit(submission_record()),
        Err(RequestServiceError::Repository(RepositoryError::Conflict))
    ));
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service();
    assert!(matches!(
        service.get(&RequestId("req-missing".to_string())),
        Err(RequestServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn final_status_is_locked() {
    let (service, _, notifications) = build_service();
    let stored = service.submit(submission_record()).expect("accepted");

    let reviewing = service
        .update_status(&stored.id, RequestStatus::Reviewing, None)
        .expect("pending can move to reviewing");
    assert_eq!(reviewing.status, RequestStatus::Reviewing);

    let approved = service
        .update_status(
            &stored.id,
            RequestStatus::Approved,
            Some("Documentazione verificata".to_string()),
        )
        .expect("reviewing can be approved");
    assert_eq!(approved.admin_notes.as_deref(), Some("Documentazione verificata"));

    assert!(matches!(
        service.update_status(&stored.id, RequestStatus::Rejected, None),
        Err(RequestServiceError::FinalStatus {
            current: RequestStatus::Approved
        })
    ));

    let templates: Vec<_> = notifications
        .events()
        .into_iter()
        .map(|event| event.template)
        .collect();
    assert_eq!(templates, vec!["request_received", "request_approved"]);
}

#[test]
fn list_respects_limit() {
    let (service, _, _) = build_service();
    service.submit(submission_record()).expect("first");
    service.submit(submission_record()).expect("second");
    assert_eq!(service.list(1).expect("listing").len(), 1);
    assert_eq!(service.list(10).expect("listing").len(), 2);
}

#[test]
fn evaluation_lead_is_priced_and_forwarded() {
    let (service, _, notifications) = build_service();
    let lead = service
        .register_evaluation(EvaluationInquiry {
            credit_type: "crediti-4-0".to_string(),
            amount: 50_000.0,
            email: "cfo@meccanica.it".to_string(),
            phone: Some("+39 011 555 0101".to_string()),
            company_name: Some("Meccanica Torino S.p.A.".to_string()),
        })
        .expect("lead accepted");

    assert!(lead.lead_id.starts_with("eval-"));
    assert_eq!(lead.evaluation.sale_value, Money::from_cents(3_500_000));
    assert_eq!(lead.evaluation.net_amount, Money::from_cents(2_500_000));

    let events = notifications.events();
    assert_eq!(events[0].template, "evaluation_requested");
    assert_eq!(events[0].details["company"], "Meccanica Torino S.p.A.");
}

#[test]
fn evaluation_lead_requires_known_credit_and_valid_email() {
    let (service, _, _) = build_service();
    let inquiry = EvaluationInquiry {
        credit_type: "bonus-mobili".to_string(),
        amount: 10_000.0,
        email: "cfo@meccanica.it".to_string(),
        phone: None,
        company_name: None,
    };
    assert!(matches!(
        service.register_evaluation(inquiry.clone()),
        Err(RequestServiceError::Validation(IntakeViolation::Valuation(_)))
    ));

    let bad_email = EvaluationInquiry {
        credit_type: "superbonus".to_string(),
        email: "@meccanica.it".to_string(),
        ..inquiry
    };
    assert!(matches!(
        service.register_evaluation(bad_email),
        Err(RequestServiceError::Validation(IntakeViolation::InvalidEmail(_)))
    ));
}

#[test]
fn contact_message_requires_text() {
    let (service, _, notifications) = build_service();
    let message = ContactMessage {
        name: "Giulia Bianchi".to_string(),
        email: "giulia@bianchi.it".to_string(),
        phone: None,
        message: "   ".to_string(),
    };
    assert!(matches!(
        service.register_contact(message.clone()),
        Err(RequestServiceError::Validation(IntakeViolation::MissingField("message")))
    ));

    let receipt = service
        .register_contact(ContactMessage {
            message: "Vorrei informazioni sul credito IVA".to_string(),
            ..message
        })
        .expect("contact accepted");
    assert!(receipt.lead_id.starts_with("contact-"));
    assert_eq!(notifications.events()[0].template, "contact_received");
}
