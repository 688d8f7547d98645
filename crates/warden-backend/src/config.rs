//! Backend connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BackendError;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "WARDEN_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "WARDEN_REQUEST_TIMEOUT_SECS";

// ---------------------------------------------------------------------------
// EndpointPaths
// ---------------------------------------------------------------------------

/// Paths of the auth endpoints, relative to [`BackendConfig::base_url`].
///
/// The defaults match the backend's `/auth` router. They are an external
/// contract, so they're configurable rather than baked into requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub login: String,
    pub me: String,
    pub verify: String,
    pub logout: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            me: "/auth/me".into(),
            verify: "/auth/verify".into(),
            logout: "/auth/logout".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Where the auth backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Scheme, host and optional path prefix, e.g. `http://localhost:8000`.
    /// A trailing slash is ignored.
    pub base_url: String,

    /// Per-request timeout in seconds. 0 disables the timeout.
    pub request_timeout_secs: u64,

    /// Endpoint paths.
    pub paths: EndpointPaths,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            request_timeout_secs: 30,
            paths: EndpointPaths::default(),
        }
    }
}

impl BackendConfig {
    /// Creates a config pointing at `base_url` with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Reads `WARDEN_API_URL` and `WARDEN_REQUEST_TIMEOUT_SECS`, falling
    /// back to the defaults for whichever is unset.
    ///
    /// # Errors
    /// Returns [`BackendError::Config`] if the timeout isn't an integer.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, BackendError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                BackendError::Config(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
        }
        Ok(config)
    }

    /// The request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0)
            .then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Joins the base URL and an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
