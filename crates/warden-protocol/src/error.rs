//! Error types for the protocol layer.
//!
//! Each crate in Warden defines its own error enum. A `ProtocolError`
//! always means the bytes didn't match the expected shape, never that
//! the network or the store failed.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: malformed JSON, missing required fields, wrong
    /// data types, or a truncated body.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body decoded but violates a protocol rule, e.g. an empty
    /// access token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
