//! Documents and question selected by the user before submission.

use std::path::Path;

/// One attached document: an opaque blob plus its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk. The display name is the file name component.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    /// MIME type sent with the document's part.
    pub fn content_type(&self) -> &'static str {
        match Path::new(&self.name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

/// Input to a submission. Order of `documents` is kept end to end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    pub documents: Vec<Document>,
    pub question: String,
}

impl UploadBatch {
    pub fn new(documents: Vec<Document>, question: impl Into<String>) -> Self {
        Self {
            documents,
            question: question.into(),
        }
    }

    pub fn document_names(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.name.clone()).collect()
    }

    pub fn is_submittable(&self) -> bool {
        !self.documents.is_empty() && !self.question.trim().is_empty()
    }
}
