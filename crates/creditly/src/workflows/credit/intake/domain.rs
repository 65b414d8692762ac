use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::credit::submission::{SubmissionReceipt, SubmissionRecord};
use crate::workflows::credit::valuation::EvaluationResult;

/// Identifier wrapper for stored credit requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Back-office lifecycle of a credit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Reviewing => "reviewing",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub const fn is_final(self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }
}

/// Request as stored after intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRequest {
    pub id: RequestId,
    pub record: SubmissionRecord,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub admin_notes: Option<String>,
}

impl CreditRequest {
    pub fn receipt(&self) -> SubmissionReceipt {
        SubmissionReceipt {
            request_id: self.id.0.clone(),
            status: self.status.label().to_string(),
            received_at: self.created_at,
        }
    }

    pub fn status_view(&self) -> CreditRequestStatusView {
        CreditRequestStatusView {
            request_id: self.id.clone(),
            credit_type: self.record.credit_type.clone(),
            company_name: self.record.company.company_name.clone(),
            status: self.status.label(),
            evaluation: self.record.evaluation.clone(),
            document_count: self.record.documents.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            admin_notes: self.admin_notes.clone(),
        }
    }
}

/// Public projection of a stored request; documents and signature stay private.
#[derive(Debug, Clone, Serialize)]
pub struct CreditRequestStatusView {
    pub request_id: RequestId,
    pub credit_type: String,
    pub company_name: String,
    pub status: &'static str,
    pub evaluation: EvaluationResult,
    pub document_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Free-evaluation form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationInquiry {
    pub credit_type: String,
    pub amount: f64,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationLead {
    pub lead_id: String,
    pub inquiry: EvaluationInquiry,
    pub evaluation: EvaluationResult,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactReceipt {
    pub lead_id: String,
    pub received_at: DateTime<Utc>,
}
