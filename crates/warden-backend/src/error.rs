/// Errors that can occur while talking to the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached (DNS, refused, reset, TLS).
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The request did not complete within the configured timeout.
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a non-2xx status.
    ///
    /// `detail` is the human-readable message from the error body, when
    /// the body carried one.
    #[error("backend rejected request with status {status}")]
    Rejected {
        status: u16,
        detail: Option<String>,
    },

    /// A 2xx response whose body didn't match the expected shape.
    #[error("malformed backend response: {0}")]
    Malformed(String),

    /// The backend configuration is unusable (bad URL, bad env var).
    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    /// Returns the backend-supplied message for a rejection.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// `true` for failures where the backend never answered.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_present_only_on_rejection() {
        let rejected = BackendError::Rejected {
            status: 401,
            detail: Some("Invalid credentials".into()),
        };
        assert_eq!(rejected.detail(), Some("Invalid credentials"));
        assert_eq!(BackendError::Timeout.detail(), None);
    }

    #[test]
    fn test_is_transport() {
        assert!(BackendError::Timeout.is_transport());
        assert!(BackendError::Unreachable("refused".into()).is_transport());
        assert!(!BackendError::Malformed("x".into()).is_transport());
    }

    #[test]
    fn test_rejected_display_includes_status() {
        let err = BackendError::Rejected {
            status: 503,
            detail: None,
        };
        assert_eq!(err.to_string(), "backend rejected request with status 503");
    }
}
