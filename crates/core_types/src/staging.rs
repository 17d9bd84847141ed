use serde::{Deserialize, Serialize};

/// A locally selected file awaiting submission. Staged files are not
/// part of any session until an upload succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Whether the declared type indicates a PDF. Pickers that supply
    /// no content type fall back to the file extension.
    pub fn is_pdf(&self) -> bool {
        if self.mime_type.eq_ignore_ascii_case("application/pdf") {
            return true;
        }
        self.mime_type.is_empty() && self.name.to_ascii_lowercase().ends_with(".pdf")
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
