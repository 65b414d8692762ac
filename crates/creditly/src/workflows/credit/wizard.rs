use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::catalog::{CatalogError, CreditCatalog, CreditType, DocumentCategory};
use super::consent::{ConsentKey, ConsentSet};
use super::contract::{self, ContractSummaryLine};
use super::documents::{
    CompletionStatus, DocumentArtifact, DocumentChecklist, DocumentError, UploadedDocument,
};
use super::domain::{CompanyFields, RequestDraft, SessionContext, Signature};
use super::drafts::{DraftSnapshot, DraftStore};
use super::submission::{
    RequestSubmitter, SubmissionBoundary, SubmissionError, SubmissionReceipt, SubmissionRecord,
};
use super::valuation::{parse_amount, EvaluationResult, ValuationCalculator};

/// Steps of the request flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    DataEntry = 1,
    Documents = 2,
    Consents = 3,
    Signature = 4,
}

impl WizardStep {
    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn title(self) -> &'static str {
        match self {
            WizardStep::DataEntry => "Dati Richiesta",
            WizardStep::Documents => "Documenti",
            WizardStep::Consents => "Privacy & Consensi",
            WizardStep::Signature => "Firma Digitale",
        }
    }

    const fn following(self) -> Option<WizardStep> {
        match self {
            WizardStep::DataEntry => Some(WizardStep::Documents),
            WizardStep::Documents => Some(WizardStep::Consents),
            WizardStep::Consents => Some(WizardStep::Signature),
            WizardStep::Signature => None,
        }
    }

    const fn preceding(self) -> Option<WizardStep> {
        match self {
            WizardStep::DataEntry => None,
            WizardStep::Documents => Some(WizardStep::DataEntry),
            WizardStep::Consents => Some(WizardStep::Documents),
            WizardStep::Signature => Some(WizardStep::Consents),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// Rule applied when leaving the documents step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentGate {
    /// Every required checklist entry has an upload.
    #[default]
    AllRequired,
    /// At least one document of any category.
    AnyDocument,
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    NotFound(#[from] CatalogError),
    #[error("step {step} is incomplete: {reason}")]
    ValidationIncomplete { step: WizardStep, reason: String },
    #[error(transparent)]
    Upload(#[from] DocumentError),
    #[error("intervention type '{0}' is not offered for this credit")]
    InvalidIntervention(String),
    #[error("requests can only be submitted from the signature step")]
    NotAtFinalStep,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Submission attempt that did not go through; the wizard is handed back untouched.
#[derive(Debug)]
pub struct SubmitFailure {
    pub wizard: Box<RequestWizard>,
    pub error: WizardError,
}

/// Linear four-step controller owning a single [`RequestDraft`].
#[derive(Debug, Clone)]
pub struct RequestWizard {
    session: SessionContext,
    credit: CreditType,
    intervention_types: &'static [&'static str],
    calculator: ValuationCalculator,
    gate: DocumentGate,
    step: WizardStep,
    draft: RequestDraft,
    checklist: DocumentChecklist,
}

impl RequestWizard {
    pub fn open(
        catalog: &CreditCatalog,
        credit_id: &str,
        session: SessionContext,
    ) -> Result<Self, WizardError> {
        let credit = catalog.get(credit_id)?.clone();
        let checklist = DocumentChecklist::new(catalog.required_documents(credit_id));
        debug!(session = %session.session_id, credit = credit.id, "request wizard opened");

        Ok(Self {
            session,
            intervention_types: catalog.intervention_types(credit_id),
            calculator: ValuationCalculator::new(catalog.clone()),
            gate: DocumentGate::default(),
            step: WizardStep::DataEntry,
            draft: RequestDraft::new(credit.id),
            credit,
            checklist,
        })
    }

    /// Reopens a flow from a cached snapshot, landing on the step it was saved at.
    pub fn resume(
        catalog: &CreditCatalog,
        session: SessionContext,
        snapshot: DraftSnapshot,
    ) -> Result<Self, WizardError> {
        let DraftSnapshot { step, draft, .. } = snapshot;
        let mut wizard = Self::open(catalog, &draft.credit_type_id, session)?;
        wizard.checklist = DocumentChecklist::with_documents(
            catalog.required_documents(&draft.credit_type_id),
            draft.documents.clone(),
        );
        wizard.draft = draft;
        wizard.draft.documents = wizard.checklist.documents().to_vec();
        wizard.step = step;
        Ok(wizard)
    }

    pub fn with_document_gate(mut self, gate: DocumentGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn credit(&self) -> &CreditType {
        &self.credit
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            step: self.step,
            draft: self.draft.clone(),
            saved_at: Utc::now(),
        }
    }

    pub fn set_company(&mut self, company: CompanyFields) {
        self.draft.company = company;
    }

    pub fn set_amount(&mut self, amount: impl Into<String>) {
        self.draft.amount = amount.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn intervention_types(&self) -> &'static [&'static str] {
        self.intervention_types
    }

    pub fn set_intervention_type(&mut self, intervention: Option<String>) -> Result<(), WizardError> {
        if let Some(value) = intervention.as_deref() {
            if !self.intervention_types.iter().any(|offered| *offered == value) {
                return Err(WizardError::InvalidIntervention(value.to_string()));
            }
        }
        self.draft.intervention_type = intervention;
        Ok(())
    }

    /// Live estimate for the amount typed so far.
    pub fn evaluation(&self) -> Option<EvaluationResult> {
        let amount = parse_amount(&self.draft.amount)?;
        self.calculator.evaluate_strict(self.credit.id, amount).ok()
    }

    pub fn upload_document(
        &mut self,
        category: DocumentCategory,
        artifact: DocumentArtifact,
    ) -> Result<UploadedDocument, WizardError> {
        let document = self.checklist.upload(category, artifact)?;
        self.draft.documents = self.checklist.documents().to_vec();
        Ok(document)
    }

    pub fn remove_document(&mut self, document_id: Uuid) -> Option<UploadedDocument> {
        let removed = self.checklist.remove(document_id)?;
        self.draft.documents = self.checklist.documents().to_vec();
        Some(removed)
    }

    pub fn checklist(&self) -> &DocumentChecklist {
        &self.checklist
    }

    pub fn document_status(&self) -> CompletionStatus {
        self.checklist.completion_status()
    }

    pub fn set_consent(&mut self, key: ConsentKey, value: bool) {
        self.draft.consents.set_consent(key, value);
    }

    pub fn consents(&self) -> ConsentSet {
        self.draft.consents.consents()
    }

    /// Records a signature, replacing any previous one.
    pub fn sign(&mut self, payload: impl Into<String>) {
        self.draft.signature = Some(Signature {
            payload: payload.into(),
            signed_at: Utc::now(),
        });
    }

    pub fn clear_signature(&mut self) {
        self.draft.signature = None;
    }

    pub fn contract_text(&self, date: NaiveDate) -> String {
        contract::render(Some(&self.credit), &self.draft, date)
    }

    pub fn contract_summary(&self) -> Vec<ContractSummaryLine> {
        contract::summary(Some(&self.credit), &self.draft, self.evaluation().as_ref())
    }

    pub fn can_proceed(&self) -> bool {
        self.check_step(self.step).is_ok()
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.check_step(self.step)?;
        if let Some(next) = self.step.following() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Moves one step back; a no-op on the first step.
    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.preceding() {
            self.step = previous;
        }
        self.step
    }

    /// Assembles the record that leaves the wizard. Every step guard must hold.
    pub fn to_submission(&self) -> Result<SubmissionRecord, WizardError> {
        if self.step != WizardStep::Signature {
            return Err(WizardError::NotAtFinalStep);
        }
        for step in [
            WizardStep::DataEntry,
            WizardStep::Documents,
            WizardStep::Consents,
            WizardStep::Signature,
        ] {
            self.check_step(step)?;
        }

        let evaluation = self.evaluation().ok_or_else(|| WizardError::ValidationIncomplete {
            step: WizardStep::DataEntry,
            reason: "amount must be a positive number".to_string(),
        })?;
        let signature = self
            .draft
            .signature
            .clone()
            .ok_or_else(|| WizardError::ValidationIncomplete {
                step: WizardStep::Signature,
                reason: "signature missing".to_string(),
            })?;

        Ok(SubmissionRecord {
            session_id: self.session.session_id.clone(),
            user_id: self.session.user_id().map(str::to_string),
            credit_type: self.credit.id.to_string(),
            company: self.draft.company.clone(),
            amount: evaluation.nominal_amount,
            evaluation,
            intervention_type: self.draft.intervention_type.clone(),
            description: self.draft.description.clone(),
            documents: self.draft.documents.clone(),
            consents: self.draft.consents.consents(),
            consent_trail: self.draft.consents.changes().to_vec(),
            signature,
            submitted_at: Utc::now(),
        })
    }

    /// Hands the request to the submission boundary and tears the wizard down on success.
    pub async fn submit<S, D>(
        self,
        boundary: &SubmissionBoundary<S, D>,
    ) -> Result<SubmissionReceipt, SubmitFailure>
    where
        S: RequestSubmitter + ?Sized,
        D: DraftStore + ?Sized,
    {
        let record = match self.to_submission() {
            Ok(record) => record,
            Err(error) => return Err(self.fail(error)),
        };

        match boundary.submit(&record, &self.snapshot()).await {
            Ok(receipt) => {
                info!(
                    session = %self.session.session_id,
                    request_id = %receipt.request_id,
                    "credit request submitted"
                );
                Ok(receipt)
            }
            Err(error) => Err(self.fail(error.into())),
        }
    }

    fn fail(self, error: WizardError) -> SubmitFailure {
        SubmitFailure {
            wizard: Box::new(self),
            error,
        }
    }

    fn check_step(&self, step: WizardStep) -> Result<(), WizardError> {
        let incomplete = |reason: &str| WizardError::ValidationIncomplete {
            step,
            reason: reason.to_string(),
        };

        match step {
            WizardStep::DataEntry => {
                if self.draft.amount.trim().is_empty() {
                    return Err(incomplete("amount is required"));
                }
                if self.draft.company.company_name.trim().is_empty() {
                    return Err(incomplete("company name is required"));
                }
                if self.evaluation().is_none() {
                    return Err(incomplete("amount must be a positive number"));
                }
                Ok(())
            }
            WizardStep::Documents => match self.gate {
                DocumentGate::AllRequired => {
                    let missing = self.checklist.missing_required();
                    if missing.is_empty() {
                        Ok(())
                    } else {
                        let names: Vec<_> = missing.iter().map(|spec| spec.display_name).collect();
                        Err(incomplete(&format!("missing {}", names.join(", "))))
                    }
                }
                DocumentGate::AnyDocument if self.checklist.documents().is_empty() => {
                    Err(incomplete("upload at least one document"))
                }
                DocumentGate::AnyDocument => Ok(()),
            },
            WizardStep::Consents => {
                if self.draft.consents.can_proceed() {
                    Ok(())
                } else {
                    Err(incomplete("privacy and anti-money-laundering consents are required"))
                }
            }
            WizardStep::Signature => {
                if self.draft.signature.is_some() {
                    Ok(())
                } else {
                    Err(incomplete("signature missing"))
                }
            }
        }
    }
}
