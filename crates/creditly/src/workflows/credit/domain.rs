use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::consent::ConsentLedger;
use super::documents::UploadedDocument;

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Caller identity threaded through the wizard and the submission boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl SessionContext {
    pub fn anonymous(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user: None,
        }
    }

    pub fn for_user(session_id: impl Into<String>, user: UserProfile) -> Self {
        Self {
            session_id: session_id.into(),
            user: Some(user),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.id.as_str())
    }
}

/// Company details captured on the first wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyFields {
    pub company_name: String,
    pub vat_number: String,
    pub fiscal_code: String,
    pub legal_representative: String,
    pub email: String,
    pub phone: String,
}

/// Rendered signature image, usually a `data:image/png;base64,...` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    pub payload: String,
    pub signed_at: DateTime<Utc>,
}

/// Working state of one request flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    pub credit_type_id: String,
    #[serde(default)]
    pub company: CompanyFields,
    /// Amount exactly as typed.
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub intervention_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
    #[serde(default)]
    pub consents: ConsentLedger,
    #[serde(default)]
    pub signature: Option<Signature>,
}

impl RequestDraft {
    pub fn new(credit_type_id: impl Into<String>) -> Self {
        Self {
            credit_type_id: credit_type_id.into(),
            company: CompanyFields::default(),
            amount: String::new(),
            intervention_type: None,
            description: String::new(),
            documents: Vec::new(),
            consents: ConsentLedger::new(),
            signature: None,
        }
    }
}
