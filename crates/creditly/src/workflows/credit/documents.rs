use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{DocumentCategory, RequiredDocumentSpec};

const FALLBACK_MIME: &str = "application/octet-stream";

/// File handed over by the document or image picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentArtifact {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: Uuid,
    pub category: DocumentCategory,
    pub display_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source_uri: String,
    pub required: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatus {
    pub completed_required: usize,
    pub total_required: usize,
    pub is_complete: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("upload failed: '{category}' is not part of the checklist for this credit")]
    UnknownCategory { category: &'static str },
    #[error("upload failed: unsupported file type '{mime}' (PDF or image expected)")]
    UnsupportedType { mime: String },
    #[error("upload failed: file source is missing")]
    MissingSource,
}

/// Tracks which checklist categories have an uploaded document.
#[derive(Debug, Clone)]
pub struct DocumentChecklist {
    requirements: Vec<RequiredDocumentSpec>,
    documents: Vec<UploadedDocument>,
}

impl DocumentChecklist {
    pub fn new(requirements: Vec<RequiredDocumentSpec>) -> Self {
        Self {
            requirements,
            documents: Vec::new(),
        }
    }

    /// Rebuilds a checklist around documents restored from a saved draft.
    pub fn with_documents(
        requirements: Vec<RequiredDocumentSpec>,
        documents: Vec<UploadedDocument>,
    ) -> Self {
        let mut checklist = Self::new(requirements);
        for document in documents {
            if checklist.spec(document.category).is_some() {
                checklist.insert(document);
            }
        }
        checklist
    }

    pub fn requirements(&self) -> &[RequiredDocumentSpec] {
        &self.requirements
    }

    pub fn documents(&self) -> &[UploadedDocument] {
        &self.documents
    }

    pub fn document_for(&self, category: DocumentCategory) -> Option<&UploadedDocument> {
        self.documents
            .iter()
            .find(|document| document.category == category)
    }

    /// Stores the artifact under `category`, replacing whatever was there.
    pub fn upload(
        &mut self,
        category: DocumentCategory,
        artifact: DocumentArtifact,
    ) -> Result<UploadedDocument, DocumentError> {
        let spec = self
            .spec(category)
            .ok_or(DocumentError::UnknownCategory {
                category: category.key(),
            })?;

        if artifact.uri.trim().is_empty() {
            return Err(DocumentError::MissingSource);
        }

        let mime_type = resolve_mime(&artifact)?;
        let document = UploadedDocument {
            id: Uuid::new_v4(),
            category,
            display_name: artifact.name,
            mime_type,
            size_bytes: artifact.size_bytes,
            source_uri: artifact.uri,
            required: spec.required,
            uploaded_at: Utc::now(),
        };

        self.insert(document.clone());
        Ok(document)
    }

    pub fn remove(&mut self, document_id: Uuid) -> Option<UploadedDocument> {
        let index = self
            .documents
            .iter()
            .position(|document| document.id == document_id)?;
        Some(self.documents.remove(index))
    }

    pub fn completion_status(&self) -> CompletionStatus {
        let required: Vec<_> = self
            .requirements
            .iter()
            .filter(|spec| spec.required)
            .collect();
        let completed_required = required
            .iter()
            .filter(|spec| self.document_for(spec.category).is_some())
            .count();

        CompletionStatus {
            completed_required,
            total_required: required.len(),
            is_complete: completed_required == required.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completion_status().is_complete
    }

    pub fn missing_required(&self) -> Vec<&RequiredDocumentSpec> {
        self.requirements
            .iter()
            .filter(|spec| spec.required && self.document_for(spec.category).is_none())
            .collect()
    }

    fn spec(&self, category: DocumentCategory) -> Option<&RequiredDocumentSpec> {
        self.requirements
            .iter()
            .find(|spec| spec.category == category)
    }

    fn insert(&mut self, document: UploadedDocument) {
        self.documents
            .retain(|existing| existing.category != document.category);
        self.documents.push(document);
    }
}

fn resolve_mime(artifact: &DocumentArtifact) -> Result<String, DocumentError> {
    let declared = artifact
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let mime: mime::Mime = match declared {
        Some(raw) => raw.parse().map_err(|_| DocumentError::UnsupportedType {
            mime: raw.to_string(),
        })?,
        None => mime_guess::from_path(&artifact.name).first_or_octet_stream(),
    };

    let accepted = mime.type_() == mime::IMAGE
        || (mime.type_() == mime::APPLICATION && mime.subtype() == mime::PDF)
        || mime.essence_str() == FALLBACK_MIME;
    if !accepted {
        return Err(DocumentError::UnsupportedType {
            mime: mime.essence_str().to_string(),
        });
    }

    Ok(mime.essence_str().to_string())
}
