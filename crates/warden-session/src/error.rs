//! Error types for the session layer.

use warden_backend::BackendError;

/// Message used when the backend rejects a login without saying why.
pub const LOGIN_FAILED_FALLBACK: &str = "Login failed";

/// Errors surfaced by user-initiated session operations.
///
/// Only [`SessionManager::login`](crate::SessionManager::login) returns
/// these. Background work (restore, scheduled refresh, remote logout)
/// absorbs its failures and shows up as a state transition instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The backend refused the request. The message is the backend's
    /// `detail` verbatim (so a UI can show it as-is), or
    /// [`LOGIN_FAILED_FALLBACK`] when there was none.
    #[error("{0}")]
    Rejected(String),

    /// The backend couldn't be reached or didn't answer in time.
    #[error("network error: {0}")]
    Transport(String),

    /// The backend answered 2xx with a body we couldn't use.
    #[error("unexpected response from auth service: {0}")]
    Malformed(String),

    /// Another `login` call is still waiting on the backend.
    #[error("a login is already in progress")]
    LoginInProgress,

    /// `logout` ran while this login was waiting on the backend; the
    /// login's result was discarded.
    #[error("login cancelled by logout")]
    Cancelled,
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected { detail, .. } => Self::Rejected(
                detail.unwrap_or_else(|| LOGIN_FAILED_FALLBACK.to_owned()),
            ),
            BackendError::Unreachable(msg) => Self::Transport(msg),
            BackendError::Timeout => Self::Transport("request timed out".into()),
            BackendError::Config(msg) => Self::Transport(msg),
            BackendError::Malformed(msg) => Self::Malformed(msg),
        }
    }
}
