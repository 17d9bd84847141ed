use std::sync::Arc;

use core_types::{
    ActiveView, BackendError, DocumentBackend, Notification, Session, SessionExport, StagedFile,
};
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::staging::UploadStaging;

/// The controller's entire mutable state, transitioned as a single
/// record by each operation. No other component mutates the session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session: Option<Session>,
    pub active_view: ActiveView,
    pub upload_in_flight: bool,
    pub question_in_flight: bool,
}

/// Owns the session lifecycle and mediates every backend call. Each
/// operation resolves into a state update or a notification; backend
/// errors never propagate past this boundary.
pub struct SessionController {
    backend: Arc<dyn DocumentBackend>,
    state: SessionState,
    staging: UploadStaging,
    notifier: Notifier,
}

impl SessionController {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            state: SessionState::default(),
            staging: UploadStaging::new(),
            notifier: Notifier::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session.as_ref()
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    pub fn staged_files(&self) -> &[StagedFile] {
        self.staging.files()
    }

    /// Stages the PDF-typed candidates from a file-drop or file-pick;
    /// anything else is discarded silently.
    pub fn stage_files(&mut self, candidates: Vec<StagedFile>) -> usize {
        self.staging.stage(candidates)
    }

    pub fn remove_staged(&mut self, index: usize) -> Option<StagedFile> {
        self.staging.remove(index)
    }

    /// Commits the staged list. A no-op when staging is empty or an
    /// upload is already in flight; staging is drained before the
    /// outcome is known.
    pub async fn commit_staged(&mut self) {
        if self.staging.is_empty() || self.state.upload_in_flight {
            return;
        }
        let files = self.staging.take();
        self.submit_upload(files).await;
    }

    pub async fn submit_upload(&mut self, files: Vec<StagedFile>) {
        if files.is_empty() {
            self.notifier.error("Select at least one PDF file to upload.");
            return;
        }
        if let Some(rejected) = files.iter().find(|file| !file.is_pdf()) {
            self.notifier
                .error(format!("{} is not a PDF file.", rejected.name));
            return;
        }

        self.state.upload_in_flight = true;
        let outcome = self.backend.upload_documents(&files).await;
        self.state.upload_in_flight = false;

        match outcome {
            Ok(receipt) => {
                info!(
                    session_id = %receipt.session_id,
                    files = receipt.uploaded_files.len(),
                    "upload accepted"
                );
                let message = match receipt.chunks_indexed() {
                    Some(chunks) => format!(
                        "Uploaded {} file(s); indexed {} content chunks.",
                        receipt.uploaded_files.len(),
                        chunks
                    ),
                    None => format!("Uploaded {} file(s).", receipt.uploaded_files.len()),
                };
                self.state.session =
                    Some(Session::new(receipt.session_id, receipt.uploaded_files));
                self.state.active_view = ActiveView::Chat;
                self.notifier.success(message);
            }
            Err(error) => {
                warn!(%error, "upload failed");
                self.notifier.error(error.user_message());
            }
        }
    }

    /// Entries are appended in completion order; the core does not
    /// serialize concurrent questions.
    pub async fn submit_question(&mut self, text: &str) {
        let Some(session_id) = self.state.session.as_ref().map(|s| s.id.clone()) else {
            self.notifier
                .error("Upload documents before asking questions.");
            return;
        };
        let question = text.trim();
        if question.is_empty() {
            return;
        }

        self.state.question_in_flight = true;
        let outcome = self.backend.ask_question(&session_id, question).await;
        self.state.question_in_flight = false;

        match outcome {
            Ok(entry) => {
                if let Some(session) = self.state.session.as_mut() {
                    session.qa_history.push(entry);
                }
            }
            Err(BackendError::SessionExpired) => self.expire_session(),
            Err(error) => {
                warn!(%error, "question failed");
                self.notifier.error(error.user_message());
            }
        }
    }

    /// Re-reads the server-side session record, replacing the local
    /// file list and history with the authoritative copy.
    pub async fn refresh_session(&mut self) {
        let Some(session_id) = self.state.session.as_ref().map(|s| s.id.clone()) else {
            return;
        };

        match self.backend.fetch_session(&session_id).await {
            Ok(detail) => {
                if let Some(session) = self.state.session.as_mut() {
                    session.uploaded_files = detail.uploaded_files;
                    session.qa_history = detail.qa_history;
                }
            }
            Err(BackendError::SessionExpired) => self.expire_session(),
            Err(error) => {
                warn!(%error, "session refresh failed");
                self.notifier.error(error.user_message());
            }
        }
    }

    /// Fetches the plain-text export of the Q&A log. The caller hands
    /// the returned bytes to the host's file-save mechanism.
    pub async fn download_session_log(&mut self) -> Option<SessionExport> {
        let Some(session_id) = self.state.session.as_ref().map(|s| s.id.clone()) else {
            self.notifier.error("No active session to export.");
            return None;
        };

        match self.backend.download_log(&session_id).await {
            Ok(bytes) => {
                let export = SessionExport {
                    file_name: export_file_name(&session_id),
                    bytes,
                };
                self.notifier
                    .success(format!("Session log ready: {}", export.file_name));
                Some(export)
            }
            Err(BackendError::SessionExpired) => {
                self.expire_session();
                None
            }
            Err(error) => {
                warn!(%error, "session download failed");
                self.notifier.error(error.user_message());
                None
            }
        }
    }

    /// Always available: clears the session, staging and any pending
    /// notification, then announces readiness.
    pub fn reset_session(&mut self) {
        self.state = SessionState::default();
        self.staging.clear();
        self.notifier.clear();
        self.notifier
            .success("Ready for a new session. Upload documents to begin.");
        info!("session reset");
    }

    /// Explicit tab selection. Chat is rejected while no session is
    /// live; Upload and History are always selectable.
    pub fn select_view(&mut self, view: ActiveView) {
        if view == ActiveView::Chat && self.state.session.is_none() {
            return;
        }
        self.state.active_view = view;
    }

    fn expire_session(&mut self) {
        warn!("backend no longer recognises this session");
        self.state.session = None;
        self.state.active_view = ActiveView::Upload;
        self.notifier
            .error(BackendError::SessionExpired.user_message());
    }
}

/// Export artifacts are named after the leading eight characters of
/// the session id.
fn export_file_name(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("studymate_session_{prefix}.txt")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use chrono::Utc;
    use core_types::{
        NotificationKind, QaEntry, SessionDetail, UploadReceipt,
    };
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct ScriptedBackend {
        uploads: Mutex<VecDeque<Result<UploadReceipt, BackendError>>>,
        questions: Mutex<VecDeque<Result<QaEntry, BackendError>>>,
        sessions: Mutex<VecDeque<Result<SessionDetail, BackendError>>>,
        downloads: Mutex<VecDeque<Result<Vec<u8>, BackendError>>>,
        upload_calls: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn unscripted<T>() -> Result<T, BackendError> {
            Err(BackendError::Unreachable("no scripted response".to_owned()))
        }
    }

    #[async_trait]
    impl DocumentBackend for ScriptedBackend {
        async fn upload_documents(
            &self,
            _files: &[StagedFile],
        ) -> Result<UploadReceipt, BackendError> {
            *self.upload_calls.lock() += 1;
            self.uploads
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn ask_question(
            &self,
            _session_id: &str,
            _question: &str,
        ) -> Result<QaEntry, BackendError> {
            self.questions
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn fetch_session(&self, _session_id: &str) -> Result<SessionDetail, BackendError> {
            self.sessions
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }

        async fn download_log(&self, _session_id: &str) -> Result<Vec<u8>, BackendError> {
            self.downloads
                .lock()
                .pop_front()
                .unwrap_or_else(Self::unscripted)
        }
    }

    fn controller_with(backend: ScriptedBackend) -> (SessionController, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        (SessionController::new(backend.clone()), backend)
    }

    fn receipt(files: &[&str], chunk_count: Option<usize>, message: &str) -> UploadReceipt {
        UploadReceipt {
            session_id: Uuid::new_v4().to_string(),
            uploaded_files: files.iter().map(|f| (*f).to_owned()).collect(),
            message: message.to_owned(),
            chunk_count,
        }
    }

    fn answer_entry(question: &str, answer: &str) -> QaEntry {
        QaEntry {
            id: Some(Uuid::new_v4().to_string()),
            timestamp: Utc::now(),
            question: question.to_owned(),
            answer: answer.to_owned(),
            references: Vec::new(),
        }
    }

    fn pdf(name: &str) -> StagedFile {
        StagedFile::new(name, "application/pdf", vec![1, 2, 3])
    }

    async fn established_session(controller: &mut SessionController, backend: &ScriptedBackend) {
        backend
            .uploads
            .lock()
            .push_back(Ok(receipt(&["a.pdf"], Some(10), "ok")));
        controller.submit_upload(vec![pdf("a.pdf")]).await;
        assert!(controller.session().is_some());
    }

    #[tokio::test]
    async fn successful_upload_establishes_session_and_chat_view() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        backend
            .uploads
            .lock()
            .push_back(Ok(receipt(&["a.pdf", "b.pdf"], Some(57), "")));

        controller
            .submit_upload(vec![pdf("a.pdf"), pdf("b.pdf")])
            .await;

        let session = controller.session().expect("session established");
        assert_eq!(session.uploaded_files, ["a.pdf", "b.pdf"]);
        assert!(session.qa_history.is_empty());
        assert_eq!(controller.state().active_view, ActiveView::Chat);
        assert!(!controller.state().upload_in_flight);

        let notification = controller.notification().expect("success notification");
        assert_eq!(notification.kind, NotificationKind::Success);
        assert!(notification.message.contains("2 file(s)"));
        assert!(notification.message.contains("57"));
    }

    #[tokio::test]
    async fn upload_notification_falls_back_to_message_parsing() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        backend.uploads.lock().push_back(Ok(receipt(
            &["a.pdf"],
            None,
            "Successfully uploaded 1 PDF(s) with 42 chunks",
        )));

        controller.submit_upload(vec![pdf("a.pdf")]).await;

        let notification = controller.notification().expect("success notification");
        assert!(notification.message.contains("42"));
    }

    #[tokio::test]
    async fn failed_upload_leaves_state_untouched() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        backend
            .uploads
            .lock()
            .push_back(Err(BackendError::ServerFault(500)));

        controller.submit_upload(vec![pdf("a.pdf")]).await;

        assert!(controller.session().is_none());
        assert_eq!(controller.state().active_view, ActiveView::Upload);
        assert!(!controller.state().upload_in_flight);
        let notification = controller.notification().expect("error notification");
        assert_eq!(notification.kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn upload_preconditions_are_enforced_locally() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());

        controller.submit_upload(Vec::new()).await;
        assert_eq!(
            controller.notification().expect("notification").kind,
            NotificationKind::Error
        );

        controller
            .submit_upload(vec![StagedFile::new("notes.txt", "text/plain", Vec::new())])
            .await;
        assert!(
            controller
                .notification()
                .expect("notification")
                .message
                .contains("notes.txt")
        );
        assert_eq!(*backend.upload_calls.lock(), 0);
    }

    #[tokio::test]
    async fn question_appends_to_history_in_completion_order() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        backend
            .questions
            .lock()
            .push_back(Ok(answer_entry("What is X", "X is Y.")));
        controller.submit_question("What is X").await;

        let session = controller.session().expect("session");
        assert_eq!(session.qa_history.len(), 1);
        assert_eq!(session.qa_history[0].question, "What is X");
        assert!(!controller.state().question_in_flight);
    }

    #[tokio::test]
    async fn blank_question_is_ignored() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        controller.submit_question("   ").await;
        assert!(controller.session().expect("session").qa_history.is_empty());
    }

    #[tokio::test]
    async fn session_not_found_tears_the_session_down() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        backend
            .questions
            .lock()
            .push_back(Ok(answer_entry("first", "answer.")));
        controller.submit_question("first").await;
        assert_eq!(controller.session().expect("session").qa_history.len(), 1);

        backend
            .questions
            .lock()
            .push_back(Err(BackendError::SessionExpired));
        controller.submit_question("second").await;

        assert!(controller.session().is_none());
        assert_eq!(controller.state().active_view, ActiveView::Upload);
        let notification = controller.notification().expect("error notification");
        assert_eq!(notification.kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn other_question_failures_keep_the_session() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        backend
            .questions
            .lock()
            .push_back(Err(BackendError::Unreachable("connection refused".into())));
        controller.submit_question("still there?").await;

        assert!(controller.session().is_some());
        assert_eq!(controller.state().active_view, ActiveView::Chat);
    }

    #[tokio::test]
    async fn commit_with_empty_staging_is_a_no_op() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());

        controller.commit_staged().await;

        assert!(controller.session().is_none());
        assert!(controller.notification().is_none());
        assert_eq!(*backend.upload_calls.lock(), 0);
    }

    #[tokio::test]
    async fn commit_drains_staging_even_on_failure() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        backend
            .uploads
            .lock()
            .push_back(Err(BackendError::ServerFault(500)));

        controller.stage_files(vec![pdf("a.pdf")]);
        controller.commit_staged().await;

        assert!(controller.staged_files().is_empty());
        assert!(controller.session().is_none());
    }

    #[tokio::test]
    async fn chat_view_is_rejected_without_a_session() {
        let (mut controller, _backend) = controller_with(ScriptedBackend::default());

        controller.select_view(ActiveView::Chat);
        assert_eq!(controller.state().active_view, ActiveView::Upload);

        controller.select_view(ActiveView::History);
        assert_eq!(controller.state().active_view, ActiveView::History);
    }

    #[tokio::test]
    async fn reset_clears_everything_and_announces_readiness() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;
        controller.stage_files(vec![pdf("extra.pdf")]);
        controller.select_view(ActiveView::History);

        controller.reset_session();

        assert!(controller.session().is_none());
        assert_eq!(controller.state().active_view, ActiveView::Upload);
        assert!(controller.staged_files().is_empty());
        let notification = controller.notification().expect("readiness notification");
        assert_eq!(notification.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn refresh_replaces_local_history_with_server_copy() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        backend.sessions.lock().push_back(Ok(SessionDetail {
            session_id: controller.session().expect("session").id.clone(),
            created_at: Utc::now(),
            uploaded_files: vec!["a.pdf".to_owned(), "late.pdf".to_owned()],
            qa_history: vec![answer_entry("q1", "a1."), answer_entry("q2", "a2.")],
        }));
        controller.refresh_session().await;

        let session = controller.session().expect("session");
        assert_eq!(session.uploaded_files.len(), 2);
        assert_eq!(session.qa_history.len(), 2);
    }

    #[tokio::test]
    async fn refresh_on_expired_session_resets_to_upload() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        established_session(&mut controller, &backend).await;

        backend
            .sessions
            .lock()
            .push_back(Err(BackendError::SessionExpired));
        controller.refresh_session().await;

        assert!(controller.session().is_none());
        assert_eq!(controller.state().active_view, ActiveView::Upload);
    }

    #[tokio::test]
    async fn download_names_export_after_session_prefix() {
        let (mut controller, backend) = controller_with(ScriptedBackend::default());
        backend.uploads.lock().push_back(Ok(UploadReceipt {
            session_id: "abcdef12-3456-7890".to_owned(),
            uploaded_files: vec!["a.pdf".to_owned()],
            message: String::new(),
            chunk_count: Some(3),
        }));
        controller.submit_upload(vec![pdf("a.pdf")]).await;

        backend
            .downloads
            .lock()
            .push_back(Ok(b"StudyMate Q&A Session Report".to_vec()));
        let export = controller
            .download_session_log()
            .await
            .expect("export available");

        assert_eq!(export.file_name, "studymate_session_abcdef12.txt");
        assert!(!export.bytes.is_empty());
        assert_eq!(
            controller.notification().expect("notification").kind,
            NotificationKind::Success
        );
    }

    #[tokio::test]
    async fn download_without_session_raises_an_error() {
        let (mut controller, _backend) = controller_with(ScriptedBackend::default());

        assert!(controller.download_session_log().await.is_none());
        assert_eq!(
            controller.notification().expect("notification").kind,
            NotificationKind::Error
        );
    }
}
