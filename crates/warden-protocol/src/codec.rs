//! Codec trait and implementations for serializing/deserializing values.
//!
//! The session layer uses a codec for two things: decoding backend
//! responses and writing the user profile into the session store. It
//! doesn't care HOW values are serialized, only that something
//! implements [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync` → the codec is shared with the refresh timer task,
///   which Tokio may run on any worker thread.
/// - `'static` → it owns everything it needs.
///
/// `decode` takes `DeserializeOwned` (not plain `Deserialize`) so the
/// result never borrows from the input buffer.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Encodes a value into a UTF-8 string.
    ///
    /// Key-value stores hold strings, so the session layer goes through
    /// this rather than `encode`.
    fn encode_str<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes).map_err(|e| {
            ProtocolError::InvalidMessage(format!("encoded value is not UTF-8: {e}"))
        })
    }

    /// Decodes a value from a string.
    fn decode_str<T: DeserializeOwned>(
        &self,
        data: &str,
    ) -> Result<T, ProtocolError> {
        self.decode(data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// The auth backend speaks JSON, and the persisted user profile is the
/// same JSON object the backend returned, so this is the only codec
/// Warden ships. Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use warden_protocol::{Codec, JsonCodec, LoginRequest};
///
/// let codec = JsonCodec;
/// let req = LoginRequest::new("bob", "hunter2");
///
/// let bytes = codec.encode(&req).unwrap();
/// let decoded: LoginRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(req, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn encode_str<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode_str<T: DeserializeOwned>(
        &self,
        data: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{UserId, UserProfile};

    fn bob() -> UserProfile {
        UserProfile {
            id: UserId::from("1"),
            username: "bob".into(),
            email: "bob@example.com".into(),
            is_active: true,
            created_at: "2024-01-01T00:00:00".into(),
        }
    }

    #[test]
    fn test_encode_str_produces_json_object() {
        let s = JsonCodec.encode_str(&bob()).unwrap();
        assert!(s.starts_with('{'));
        assert!(s.contains("\"username\":\"bob\""));
    }

    #[test]
    fn test_decode_str_restores_profile() {
        let s = JsonCodec.encode_str(&bob()).unwrap();
        let back: UserProfile = JsonCodec.decode_str(&s).unwrap();
        assert_eq!(back, bob());
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<UserProfile, _> = JsonCodec.decode_str("{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_field_returns_decode_error() {
        let result: Result<UserProfile, _> =
            JsonCodec.decode_str(r#"{"id":"1","username":"bob"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
