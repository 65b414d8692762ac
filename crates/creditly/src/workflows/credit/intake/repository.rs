use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{CreditRequest, RequestId};

/// Storage abstraction so the intake service can be exercised in isolation.
pub trait RequestRepository: Send + Sync {
    fn insert(&self, request: CreditRequest) -> Result<CreditRequest, RepositoryError>;
    fn update(&self, request: CreditRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<CreditRequest>, RepositoryError>;
    fn list(&self, limit: usize) -> Result<Vec<CreditRequest>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for back-office notifications (e-mail, CRM, chat).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub reference: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
