//! Request and response bodies for the auth backend.
//!
//! Every type here travels "on the wire": it is serialized to JSON,
//! sent over HTTP, and deserialized on the other side. The field names
//! follow the backend's snake_case JSON exactly.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A backend user identifier.
///
/// Newtype over `String` so it can't be confused with a username or a
/// token. The backend is inconsistent about the JSON type (some
/// endpoints send `"1"`, others `1`), so deserialization accepts both
/// and normalizes to the string form. It always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for UserId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Text(s) => Self(s),
            Raw::Number(n) => Self::from(n),
        })
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// Builds a login request from borrowed credentials.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }
}

/// Manual `Debug` so the password never ends up in logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer credential.
    pub access_token: String,

    /// Always `"bearer"` in practice. Defaults to that when omitted.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Token lifetime in seconds, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_owned()
}

impl TokenResponse {
    /// Checks protocol rules serde can't express.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] for an empty token or a
    /// token type other than bearer.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.access_token.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "empty access_token".into(),
            ));
        }
        if !self.token_type.eq_ignore_ascii_case("bearer") {
            return Err(ProtocolError::InvalidMessage(format!(
                "unsupported token_type {:?}",
                self.token_type
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// Body of `GET /auth/me`: a denormalized snapshot of the signed-in user.
///
/// This is also what gets persisted under the user key, so a restored
/// session carries exactly what the backend last returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    /// Creation timestamp as sent by the backend (ISO-8601, passed
    /// through verbatim).
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Body of `GET /auth/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors from the backend
// ---------------------------------------------------------------------------

/// Error body returned with a non-2xx status.
///
/// The backend sends either `{"detail": "Invalid credentials"}` or, for
/// request validation failures, `{"detail": [{"msg": "...", ...}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

/// The two shapes `detail` takes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Issues(Vec<ValidationIssue>),
}

/// One entry of a validation failure list. Only `msg` is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub msg: Option<String>,
}

impl ErrorBody {
    /// Returns the human-readable message, if the body carried one.
    ///
    /// For a validation list this is the first non-empty `msg`.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            ErrorDetail::Message(m) if !m.trim().is_empty() => Some(m.clone()),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Issues(issues) => issues
                .iter()
                .filter_map(|i| i.msg.as_deref())
                .find(|m| !m.trim().is_empty())
                .map(str::to_owned),
        }
    }
}
