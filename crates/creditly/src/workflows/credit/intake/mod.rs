//! Server-side intake of submitted credit requests, evaluation leads and contact messages.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod validation;

pub use domain::{
    ContactMessage, ContactReceipt, CreditRequest, CreditRequestStatusView, EvaluationInquiry,
    EvaluationLead, RequestId, RequestStatus,
};
pub use repository::{
    Notification, NotificationError, NotificationPublisher, RepositoryError, RequestRepository,
};
pub use router::{intake_router, CreditTypeView};
pub use service::{CreditRequestService, RequestServiceError};
pub use validation::{IntakeGuard, IntakeViolation};
