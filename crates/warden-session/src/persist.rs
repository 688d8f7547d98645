//! Reading and writing the session triple in a [`SessionStore`].
//!
//! Layout: three independent keys under a common prefix.
//!
//! | key                   | value                              |
//! |-----------------------|------------------------------------|
//! | `<prefix>.token`      | bearer token, verbatim             |
//! | `<prefix>.user`       | user profile as JSON               |
//! | `<prefix>.expires_at` | expiry, epoch ms, decimal integer  |
//!
//! The keys are always written together and removed together. Anything
//! less than the full, parseable, unexpired triple is rejected by
//! [`load`], and the caller wipes it.

use warden_protocol::{Codec, ProtocolError, UserProfile};
use warden_store::{SessionStore, StoreError};

use crate::session::Credentials;

/// The three storage keys for one prefix.
#[derive(Debug, Clone)]
pub(crate) struct StorageKeys {
    pub(crate) token: String,
    pub(crate) user: String,
    pub(crate) expires_at: String,
}

impl StorageKeys {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            token: format!("{prefix}.token"),
            user: format!("{prefix}.user"),
            expires_at: format!("{prefix}.expires_at"),
        }
    }

    fn all(&self) -> [&str; 3] {
        [
            self.token.as_str(),
            self.user.as_str(),
            self.expires_at.as_str(),
        ]
    }
}

/// Why a persisted session was not adopted.
#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    /// None of the keys are set. Not worth a warning.
    #[error("no persisted session")]
    Empty,

    #[error("persisted session is incomplete")]
    Partial,

    #[error("persisted token is blank")]
    BlankToken,

    #[error("persisted user is unreadable: {0}")]
    User(#[source] ProtocolError),

    #[error("persisted expiry {0:?} is not an integer")]
    Expiry(String),

    #[error("persisted session expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reads the triple and checks it is complete and unexpired at `now_ms`.
pub(crate) fn load<S: SessionStore, C: Codec>(
    store: &S,
    codec: &C,
    keys: &StorageKeys,
    now_ms: u64,
) -> Result<Credentials, LoadError> {
    let token = store.get(&keys.token)?;
    let user = store.get(&keys.user)?;
    let expires_at = store.get(&keys.expires_at)?;

    let (token, user, expires_at) = match (token, user, expires_at) {
        (Some(t), Some(u), Some(e)) => (t, u, e),
        (None, None, None) => return Err(LoadError::Empty),
        _ => return Err(LoadError::Partial),
    };

    if token.trim().is_empty() {
        return Err(LoadError::BlankToken);
    }
    let user: UserProfile = codec.decode_str(&user).map_err(LoadError::User)?;
    let expires_at: u64 = expires_at
        .trim()
        .parse()
        .map_err(|_| LoadError::Expiry(expires_at.clone()))?;
    if expires_at <= now_ms {
        return Err(LoadError::Expired {
            expires_at,
            now: now_ms,
        });
    }

    Ok(Credentials {
        token,
        user,
        expires_at,
    })
}

/// Writes the triple in one batch.
pub(crate) fn save<S: SessionStore, C: Codec>(
    store: &S,
    codec: &C,
    keys: &StorageKeys,
    credentials: &Credentials,
) -> Result<(), SaveError> {
    let user = codec.encode_str(&credentials.user)?;
    let expires_at = credentials.expires_at.to_string();
    store.set_all(&[
        (keys.token.as_str(), credentials.token.as_str()),
        (keys.user.as_str(), user.as_str()),
        (keys.expires_at.as_str(), expires_at.as_str()),
    ])?;
    Ok(())
}

/// Removes all three keys.
pub(crate) fn clear<S: SessionStore>(
    store: &S,
    keys: &StorageKeys,
) -> Result<(), StoreError> {
    store.remove_all(&keys.all())
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SaveError {
    #[error(transparent)]
    Encode(#[from] ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
