use crate::workflows::credit::catalog::CreditCatalog;
use crate::workflows::credit::consent::ConsentKey;
use crate::workflows::credit::submission::SubmissionRecord;
use crate::workflows::credit::valuation::{ValuationCalculator, ValuationError};

use super::domain::{ContactMessage, EvaluationInquiry};

/// Reasons an inbound request or lead is refused.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IntakeViolation {
    #[error(transparent)]
    Valuation(#[from] ValuationError),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("email address '{0}' is not valid")]
    InvalidEmail(String),
    #[error("consent '{}' is required", .0.label())]
    MissingConsent(ConsentKey),
    #[error("signature is missing")]
    MissingSignature,
    #[error("required documents missing: {}", .0.join(", "))]
    MissingDocuments(Vec<String>),
}

/// Server-side re-check of everything the wizard gates on the client, and nothing more.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    catalog: CreditCatalog,
    calculator: ValuationCalculator,
}

impl IntakeGuard {
    pub fn new(catalog: CreditCatalog) -> Self {
        Self {
            calculator: ValuationCalculator::new(catalog.clone()),
            catalog,
        }
    }

    pub fn catalog(&self) -> &CreditCatalog {
        &self.catalog
    }

    pub fn calculator(&self) -> &ValuationCalculator {
        &self.calculator
    }

    /// Validates the record and replaces its evaluation with a server-side one.
    pub fn check_submission(
        &self,
        mut record: SubmissionRecord,
    ) -> Result<SubmissionRecord, IntakeViolation> {
        let evaluation = self
            .calculator
            .evaluate_strict(&record.credit_type, record.amount.as_euros())?;

        require(&record.company.company_name, "company name")?;

        for key in ConsentKey::ALL {
            if key.is_mandatory() && !record.consents.get(key) {
                return Err(IntakeViolation::MissingConsent(key));
            }
        }

        if record.signature.payload.trim().is_empty() {
            return Err(IntakeViolation::MissingSignature);
        }

        let missing: Vec<String> = self
            .catalog
            .required_documents(&record.credit_type)
            .into_iter()
            .filter(|spec| spec.required)
            .filter(|spec| {
                !record
                    .documents
                    .iter()
                    .any(|document| document.category == spec.category)
            })
            .map(|spec| spec.display_name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IntakeViolation::MissingDocuments(missing));
        }

        record.amount = evaluation.nominal_amount;
        record.evaluation = evaluation;
        Ok(record)
    }

    pub fn check_inquiry(&self, inquiry: &EvaluationInquiry) -> Result<(), IntakeViolation> {
        self.catalog
            .get(&inquiry.credit_type)
            .map_err(ValuationError::from)?;
        check_email(&inquiry.email)
    }

    pub fn check_contact(&self, message: &ContactMessage) -> Result<(), IntakeViolation> {
        require(&message.name, "name")?;
        check_email(&message.email)?;
        require(&message.message, "message")
    }
}

fn require(value: &str, field: &'static str) -> Result<(), IntakeViolation> {
    if value.trim().is_empty() {
        Err(IntakeViolation::MissingField(field))
    } else {
        Ok(())
    }
}

/// Accepts `local@domain.tld` with no whitespace.
pub(crate) fn check_email(raw: &str) -> Result<(), IntakeViolation> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(IntakeViolation::MissingField("email"));
    }

    let valid = !email.chars().any(char::is_whitespace)
        && match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain
                        .split_once('.')
                        .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                        .unwrap_or(false)
            }
            None => false,
        };

    if valid {
        Ok(())
    } else {
        Err(IntakeViolation::InvalidEmail(email.to_string()))
    }
}
