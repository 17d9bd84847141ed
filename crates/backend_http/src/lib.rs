use std::time::Duration;

use async_trait::async_trait;
use core_types::{
    BackendError, DocumentBackend, QaEntry, SessionDetail, StagedFile, UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_QUESTION_TIMEOUT: Duration = Duration::from_secs(120);

/// `DocumentBackend` over the StudyMate HTTP API.
#[derive(Debug, Clone)]
pub struct HttpDocumentBackend {
    http: reqwest::Client,
    base_url: String,
    upload_timeout: Duration,
    question_timeout: Duration,
}

impl HttpDocumentBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            question_timeout: DEFAULT_QUESTION_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, upload: Duration, question: Duration) -> Self {
        self.upload_timeout = upload;
        self.question_timeout = question;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct QuestionRequest<'a> {
    question: &'a str,
    session_id: &'a str,
}

#[async_trait]
impl DocumentBackend for HttpDocumentBackend {
    async fn upload_documents(&self, files: &[StagedFile]) -> Result<UploadReceipt, BackendError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str("application/pdf")
                .map_err(request_error)?;
            form = form.part("files", part);
        }

        let response = self
            .http
            .post(self.endpoint("/api/upload"))
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(request_error)?;
        read_json(response, false).await
    }

    async fn ask_question(
        &self,
        session_id: &str,
        question: &str,
    ) -> Result<QaEntry, BackendError> {
        let response = self
            .http
            .post(self.endpoint("/api/question"))
            .json(&QuestionRequest {
                question,
                session_id,
            })
            .timeout(self.question_timeout)
            .send()
            .await
            .map_err(request_error)?;
        read_json(response, true).await
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetail, BackendError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/api/session/{session_id}")))
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(request_error)?;
        read_json(response, true).await
    }

    async fn download_log(&self, session_id: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .get(self.endpoint(&format!("/api/session/{session_id}/download")))
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = extract_detail(&response.text().await.unwrap_or_default());
            return Err(classify_status(status, detail, true));
        }
        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

/// Transport-level failures (connect errors, timeouts) all mean the
/// backend could not be reached.
fn request_error(error: reqwest::Error) -> BackendError {
    BackendError::Unreachable(error.to_string())
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    session_scoped: bool,
) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let detail = extract_detail(&response.text().await.unwrap_or_default());
        return Err(classify_status(status, detail, session_scoped));
    }

    match response.json().await {
        Ok(value) => Ok(value),
        Err(error) => {
            warn!(%error, "backend returned a malformed response body");
            Err(BackendError::ServerFault(status.as_u16()))
        }
    }
}

fn classify_status(
    status: StatusCode,
    detail: Option<String>,
    session_scoped: bool,
) -> BackendError {
    if session_scoped && status == StatusCode::NOT_FOUND {
        return BackendError::SessionExpired;
    }
    if status.is_client_error() {
        let message = detail
            .unwrap_or_else(|| format!("The backend rejected the request (status {status})."));
        return BackendError::ValidationFailed(message);
    }
    BackendError::ServerFault(status.as_u16())
}

/// FastAPI-style error bodies carry the user-facing text in a
/// `detail` field; fall back to the raw body when it is readable.
fn extract_detail(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(detail) = value.get("detail").and_then(|d| d.as_str())
    {
        return Some(detail.to_owned());
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
