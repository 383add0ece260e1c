//! Validation and multipart serialization of an [`UploadBatch`].

use reqwest::multipart::{Form, Part as FormPart};

use crate::batch::UploadBatch;
use crate::error::ValidationError;

/// Form field carrying each document.
pub const DOCUMENT_FIELD: &str = "pdfs";
/// Form field carrying the question.
pub const QUESTION_FIELD: &str = "prompt";

/// One part of the outbound multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    File {
        field: &'static str,
        file_name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
    Text {
        field: &'static str,
        value: String,
    },
}

/// Transport-ready body: document parts in batch order, then the question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub parts: Vec<Part>,
}

impl Payload {
    pub fn file_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::File { file_name, .. } => Some(file_name.as_str()),
                Part::Text { .. } => None,
            })
            .collect()
    }

    /// Convert to a reqwest form at the network boundary.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part {
                Part::File {
                    field,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = FormPart::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(content_type)?;
                    form.part(field, part)
                }
                Part::Text { field, value } => form.text(field, value),
            };
        }
        Ok(form)
    }
}

pub fn validate(batch: &UploadBatch) -> Result<(), ValidationError> {
    if batch.documents.is_empty() {
        return Err(ValidationError::NoDocuments);
    }
    if batch.question.trim().is_empty() {
        return Err(ValidationError::EmptyQuestion);
    }
    Ok(())
}

/// Validate `batch` and build its payload. Never returns a partial payload.
pub fn compose(batch: &UploadBatch) -> Result<Payload, ValidationError> {
    validate(batch)?;

    let mut parts: Vec<Part> = batch
        .documents
        .iter()
        .map(|doc| Part::File {
            field: DOCUMENT_FIELD,
            file_name: doc.name.clone(),
            content_type: doc.content_type(),
            bytes: doc.bytes.clone(),
        })
        .collect();
    parts.push(Part::Text {
        field: QUESTION_FIELD,
        value: batch.question.clone(),
    });

    Ok(Payload { parts })
}
