use thiserror::Error;

/// Failure taxonomy for backend calls. Every error resolves at the
/// controller boundary into a state update or a notification; nothing
/// propagates further up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("backend fault (status {0})")]
    ServerFault(u16),

    #[error("session not found")]
    SessionExpired,
}

impl BackendError {
    /// User-facing message for the notification raised on failure.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Unreachable(_) => {
                "Cannot reach the StudyMate backend. Check that it is running and try again."
                    .to_owned()
            }
            BackendError::ValidationFailed(detail) => detail.clone(),
            BackendError::ServerFault(status) => format!(
                "The backend failed to process the request (status {status}). Please try again."
            ),
            BackendError::SessionExpired => {
                "This session is no longer available. Upload documents to start a new one."
                    .to_owned()
            }
        }
    }
}
