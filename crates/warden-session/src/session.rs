//! Session types: the data structures that describe who is signed in.
//!
//! A "session" here is the client's record of its own authentication:
//! - WHO is signed in (`UserProfile`)
//! - WHAT proves it (the bearer token)
//! - UNTIL WHEN (`expires_at`, epoch milliseconds)
//! - and the derived [`SessionStatus`]

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_protocol::UserProfile;

/// Name of the HTTP header carrying the bearer token.
pub const AUTHORIZATION: &str = "Authorization";

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime given to a token when the backend's login response has
    /// no `expires_in`.
    ///
    /// Default: 30 days. The backend doesn't document its token
    /// lifetime, so this is a best guess and meant to be overridden.
    pub default_ttl: Duration,

    /// How long before expiry the background re-verification runs.
    ///
    /// Default: 5 minutes. A session with less than this left gets no
    /// timer; it is re-verified on next use instead.
    pub refresh_lead: Duration,

    /// Prefix of the storage keys (`<prefix>.token`, `<prefix>.user`,
    /// `<prefix>.expires_at`).
    ///
    /// Default: `"warden"`.
    pub storage_prefix: String,

    /// Whether `logout` also tells the backend (fire-and-forget).
    ///
    /// Default: `false`.
    pub remote_logout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            refresh_lead: Duration::from_secs(5 * 60),
            storage_prefix: "warden".into(),
            remote_logout: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Where the session is in its lifecycle.
///
/// ```text
///                 login()            ok
///   Anonymous ─────────────→ Authenticating ─────→ Authenticated
///       ↑                          │                    │
///       └───────── err ────────────┘                    │
///       └──── logout / failed re-verify / expiry ───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No usable credentials.
    Anonymous,
    /// A login is waiting on the backend.
    Authenticating,
    /// Token, user and a future expiry are all present.
    Authenticated,
}

impl SessionStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials (the stored triple)
// ---------------------------------------------------------------------------

/// Token, user and expiry, always held together.
///
/// The manager stores `Option<Credentials>`, so a token without a user
/// (or any other partial combination) can't be represented.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Credentials {
    pub(crate) token: String,
    pub(crate) user: UserProfile,
    pub(crate) expires_at: u64,
}

impl Credentials {
    pub(crate) fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at > now_ms
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("user", &self.user.username)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session (public snapshot)
// ---------------------------------------------------------------------------

/// A point-in-time view of the session, handed to subscribers and
/// returned by [`SessionManager::session`](crate::SessionManager::session).
///
/// Snapshots are plain values; they don't change when the manager does.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at: Option<u64>,
    pub status: SessionStatus,
}

impl Session {
    /// The empty session.
    pub fn anonymous() -> Self {
        Self {
            token: None,
            user: None,
            expires_at: None,
            status: SessionStatus::Anonymous,
        }
    }

    /// Resolves the snapshot for the given credentials at `now_ms`.
    pub(crate) fn resolve(
        credentials: Option<&Credentials>,
        authenticating: bool,
        now_ms: u64,
    ) -> Self {
        let status = match credentials {
            _ if authenticating => SessionStatus::Authenticating,
            Some(c) if c.is_live(now_ms) => SessionStatus::Authenticated,
            _ => SessionStatus::Anonymous,
        };
        Self {
            token: credentials.map(|c| c.token.clone()),
            user: credentials.map(|c| c.user.clone()),
            expires_at: credentials.map(|c| c.expires_at),
            status,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }

    /// The `Authorization` header for this snapshot, or `None` unless
    /// authenticated.
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        match (&self.token, self.status) {
            (Some(token), SessionStatus::Authenticated) => {
                Some((AUTHORIZATION, format!("Bearer {token}")))
            }
            _ => None,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use warden_protocol::UserId;

    use super::*;

    fn creds(expires_at: u64) -> Credentials {
        Credentials {
            token: "abc".into(),
            user: UserProfile {
                id: UserId::from("1"),
                username: "bob".into(),
                email: "bob@example.com".into(),
                is_active: true,
                created_at: "2024-01-01T00:00:00".into(),
            },
            expires_at,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(2_592_000));
        assert_eq!(config.refresh_lead, Duration::from_secs(300));
        assert_eq!(config.storage_prefix, "warden");
        assert!(!config.remote_logout);
    }

    #[test]
    fn test_resolve_live_credentials_is_authenticated() {
        let s = Session::resolve(Some(&creds(2_000)), false, 1_000);
        assert_eq!(s.status, SessionStatus::Authenticated);
        assert_eq!(s.token.as_deref(), Some("abc"));
        assert_eq!(s.expires_at, Some(2_000));
    }

    #[test]
    fn test_resolve_expired_credentials_is_anonymous() {
        let s = Session::resolve(Some(&creds(1_000)), false, 1_000);
        assert_eq!(s.status, SessionStatus::Anonymous);
        assert_eq!(s.auth_header(), None);
    }

    #[test]
    fn test_resolve_authenticating_wins() {
        let s = Session::resolve(None, true, 0);
        assert_eq!(s.status, SessionStatus::Authenticating);
    }

    #[test]
    fn test_resolve_no_credentials_is_anonymous() {
        assert_eq!(Session::resolve(None, false, 0), Session::anonymous());
    }

    #[test]
    fn test_auth_header_when_authenticated() {
        let s = Session::resolve(Some(&creds(2_000)), false, 1_000);
        assert_eq!(
            s.auth_header(),
            Some(("Authorization", "Bearer abc".to_owned()))
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let s = Session::resolve(Some(&creds(2_000)), false, 1_000);
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("abc"));
        assert!(dbg.contains("bob"));
        assert!(!format!("{:?}", creds(1)).contains("abc"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Anonymous.to_string(), "anonymous");
        assert_eq!(SessionStatus::Authenticating.to_string(), "authenticating");
        assert_eq!(SessionStatus::Authenticated.to_string(), "authenticated");
    }
}
