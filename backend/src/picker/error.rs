use std::time::Duration;

/// Failures of the picker session lifecycle, kept distinct up to the UI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickerError {
    #[error("caller is not authenticated")]
    Unauthenticated,
    #[error("picker provider returned {status_code}: {body}")]
    Provider { status_code: u16, body: String },
    #[error("picker provider unreachable: {0}")]
    Transport(String),
    #[error("no picker session for {0}")]
    NotFound(String),
    #[error("picker session {0} has expired")]
    SessionExpired(String),
    #[error("media selection is not complete")]
    SelectionIncomplete,
    #[error("polling stopped after {0:?} without a completed selection")]
    PollTimeout(Duration),
    #[error("polling was canceled")]
    PollCanceled,
    #[error("media url rejected: {0}")]
    InvalidMediaUrl(String),
    #[error("session store failure: {0}")]
    Store(String),
}

impl PickerError {
    /// Whether a polling loop can keep going after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, PickerError::Provider { .. } | PickerError::Transport(_))
    }
}

impl From<reqwest::Error> for PickerError {
    fn from(err: reqwest::Error) -> Self {
        PickerError::Transport(err.to_string())
    }
}
