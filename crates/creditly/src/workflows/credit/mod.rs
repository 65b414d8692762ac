//! Fiscal-credit request flow: catalog, valuation, document checklist, consents,
//! contract preview, the four-step wizard and the submission boundary.

pub mod catalog;
pub mod consent;
pub mod contract;
pub mod documents;
pub mod domain;
pub mod drafts;
pub mod intake;
pub mod submission;
pub mod valuation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use catalog::{
    CatalogError, CreditCatalog, CreditIcon, CreditType, DocumentCategory, RequiredDocumentSpec,
    FALLBACK_COMMISSION_RATE,
};
pub use consent::{ConsentChange, ConsentKey, ConsentLedger, ConsentSet};
pub use contract::ContractSummaryLine;
pub use documents::{
    CompletionStatus, DocumentArtifact, DocumentChecklist, DocumentError, UploadedDocument,
};
pub use domain::{CompanyFields, RequestDraft, SessionContext, Signature, UserProfile, UserRole};
pub use drafts::{DraftSnapshot, DraftStore, DraftStoreError, FileDraftStore, InMemoryDraftStore};
pub use submission::{
    HttpRequestSubmitter, RequestSubmitter, SubmissionBoundary, SubmissionError,
    SubmissionReceipt, SubmissionRecord, DEFAULT_SUBMISSION_TIMEOUT,
};
pub use valuation::{
    parse_amount, EvaluationResult, Money, RateSource, ValuationCalculator, ValuationError,
    SALE_VALUE_PERCENT,
};
pub use wizard::{DocumentGate, RequestWizard, SubmitFailure, WizardError, WizardStep};
