//! Unified error type for Warden.

use warden_backend::BackendError;
use warden_protocol::ProtocolError;
use warden_session::SessionError;
use warden_store::StoreError;

/// Top-level error wrapping every sub-crate error.
///
/// Applications using the `warden` crate can return this one type and
/// let `?` convert the rest.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Encoding or decoding a payload failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The auth backend could not be built or reached.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session operation (login) failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let warden_err: WardenError = err.into();
        assert!(matches!(warden_err, WardenError::Protocol(_)));
    }

    #[test]
    fn test_from_backend_error() {
        let warden_err: WardenError = BackendError::Timeout.into();
        assert!(matches!(warden_err, WardenError::Backend(_)));
    }

    #[test]
    fn test_from_store_error() {
        let warden_err: WardenError = StoreError::Corrupt("truncated".into()).into();
        assert!(matches!(warden_err, WardenError::Store(_)));
        assert!(warden_err.to_string().contains("truncated"));
    }

    #[test]
    fn test_from_session_error_keeps_message() {
        let err = SessionError::Rejected("Invalid credentials".into());
        let warden_err: WardenError = err.into();
        assert!(matches!(warden_err, WardenError::Session(_)));
        assert_eq!(warden_err.to_string(), "Invalid credentials");
    }
}
