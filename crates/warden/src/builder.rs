//! `WardenBuilder`: wires an HTTP backend, a store and a config into a
//! ready-to-use [`SessionManager`].

use warden_backend::{BackendConfig, HttpBackend};
use warden_session::{SessionConfig, SessionManager};
use warden_store::{MemoryStore, SessionStore};

use crate::WardenError;

/// A session manager talking to the HTTP auth backend.
pub type Warden<S = MemoryStore> = SessionManager<HttpBackend, S>;

/// Builder for a [`Warden`] session manager.
///
/// # Example
///
/// ```rust,no_run
/// use warden::prelude::*;
///
/// # async fn run() -> Result<(), WardenError> {
/// let warden = WardenBuilder::new()
///     .base_url("http://localhost:8000")
///     .store(FileStore::new("session.json"))
///     .build()?;
///
/// warden.restore();
/// if !warden.is_authenticated() {
///     warden.login("bob", "hunter2").await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct WardenBuilder<S = MemoryStore> {
    backend_config: BackendConfig,
    session_config: SessionConfig,
    store: S,
}

impl WardenBuilder<MemoryStore> {
    /// Creates a builder with default settings and an in-memory store.
    pub fn new() -> Self {
        Self {
            backend_config: BackendConfig::default(),
            session_config: SessionConfig::default(),
            store: MemoryStore::new(),
        }
    }

    /// Like [`new`](Self::new), with the backend settings read from the
    /// environment (see [`BackendConfig::from_env`]).
    ///
    /// # Errors
    /// [`WardenError::Backend`] if an environment value is invalid.
    pub fn from_env() -> Result<Self, WardenError> {
        Ok(Self::new().backend_config(BackendConfig::from_env()?))
    }
}

impl Default for WardenBuilder<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SessionStore> WardenBuilder<S> {
    /// Sets the backend base URL, keeping the other backend settings.
    pub fn base_url(mut self, url: &str) -> Self {
        self.backend_config.base_url = url.to_string();
        self
    }

    /// Replaces the backend settings.
    pub fn backend_config(mut self, config: BackendConfig) -> Self {
        self.backend_config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Swaps the store the session is persisted in.
    pub fn store<T: SessionStore>(self, store: T) -> WardenBuilder<T> {
        WardenBuilder {
            backend_config: self.backend_config,
            session_config: self.session_config,
            store,
        }
    }

    /// Builds the manager. The result starts anonymous; call
    /// [`restore`](SessionManager::restore) to pick up a persisted
    /// session.
    ///
    /// # Errors
    /// [`WardenError::Backend`] if the HTTP client can't be created.
    pub fn build(self) -> Result<Warden<S>, WardenError> {
        let backend = HttpBackend::new(self.backend_config)?;
        tracing::debug!(
            storage_prefix = %self.session_config.storage_prefix,
            "warden session manager built"
        );
        Ok(SessionManager::new(backend, self.store, self.session_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_other_settings() {
        let builder = WardenBuilder::new()
            .backend_config(BackendConfig {
                request_timeout_secs: 5,
                ..BackendConfig::default()
            })
            .base_url("http://auth.internal");

        assert_eq!(builder.backend_config.base_url, "http://auth.internal");
        assert_eq!(builder.backend_config.request_timeout_secs, 5);
    }

    #[test]
    fn test_store_swap_keeps_config() {
        let config = SessionConfig {
            storage_prefix: "app".into(),
            ..SessionConfig::default()
        };
        let store = MemoryStore::with_entries([("k", "v")]);

        let builder = WardenBuilder::new()
            .session_config(config.clone())
            .store(store.clone());

        assert_eq!(builder.session_config, config);
        assert_eq!(builder.store.len(), 1);
    }

    #[test]
    fn test_build_starts_anonymous() {
        let warden = WardenBuilder::new().build().unwrap();
        assert!(!warden.is_authenticated());
        assert_eq!(warden.auth_header(), None);
    }
}
