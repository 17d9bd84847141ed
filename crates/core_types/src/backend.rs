use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::session::{QaEntry, loose_timestamp};
use crate::staging::StagedFile;

/// Response body of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub session_id: String,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default)]
    pub message: String,
    /// Number of content chunks the backend indexed. Newer backends
    /// report this as a dedicated field; older ones only embed it in
    /// the free-text `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
}

impl UploadReceipt {
    /// Indexed chunk count, preferring the structured field and only
    /// then falling back to the last integer token of `message`.
    pub fn chunks_indexed(&self) -> Option<usize> {
        if self.chunk_count.is_some() {
            return self.chunk_count;
        }
        self.message
            .split_whitespace()
            .filter_map(|token| token.parse::<usize>().ok())
            .next_back()
    }
}

/// Server-side session record, as returned by the session detail
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: String,
    #[serde(with = "loose_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default)]
    pub qa_history: Vec<QaEntry>,
}

/// An exportable rendering of the Q&A log, ready to be handed to the
/// host environment's file-save mechanism.
#[derive(Debug, Clone)]
pub struct SessionExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The remote document question-answering API. Parsing, retrieval and
/// answer generation all happen on the other side of this seam.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn upload_documents(&self, files: &[StagedFile]) -> Result<UploadReceipt, BackendError>;

    async fn ask_question(
        &self,
        session_id: &str,
        question: &str,
    ) -> Result<QaEntry, BackendError>;

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetail, BackendError>;

    async fn download_log(&self, session_id: &str) -> Result<Vec<u8>, BackendError>;
}
