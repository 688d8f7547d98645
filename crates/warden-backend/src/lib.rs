//! Auth backend abstraction for Warden.
//!
//! Provides the [`AuthBackend`] trait, which abstracts over however the
//! session manager reaches the authentication service, and an HTTP
//! implementation ([`HttpBackend`]) for the usual `/auth/*` REST API.
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTP backend via `reqwest`

mod config;
mod error;
#[cfg(feature = "http")]
mod http;

pub use config::{BackendConfig, EndpointPaths};
pub use error::BackendError;
#[cfg(feature = "http")]
pub use http::HttpBackend;

use warden_protocol::{LoginRequest, TokenResponse, UserProfile, VerifyResponse};

/// The remote authentication service, treated as a black box.
///
/// # Trait bounds
///
/// - `Send + Sync` → the backend is shared between the caller's task and
///   the background refresh task.
/// - `'static` → it lives as long as the session manager.
///
/// Every method returns a `Send` future so calls can be driven from a
/// spawned Tokio task.
///
/// # Example
///
/// ```rust
/// use warden_backend::{AuthBackend, BackendError};
/// use warden_protocol::{LoginRequest, TokenResponse, UserProfile, VerifyResponse};
///
/// /// Rejects everything. Handy as a placeholder while wiring up a UI.
/// struct Offline;
///
/// impl AuthBackend for Offline {
///     async fn login(&self, _req: &LoginRequest) -> Result<TokenResponse, BackendError> {
///         Err(BackendError::Unreachable("offline".into()))
///     }
///     async fn current_user(&self, _token: &str) -> Result<UserProfile, BackendError> {
///         Err(BackendError::Unreachable("offline".into()))
///     }
///     async fn verify(&self, _token: &str) -> Result<VerifyResponse, BackendError> {
///         Err(BackendError::Unreachable("offline".into()))
///     }
/// }
/// ```
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchanges credentials for a bearer token (`POST /auth/login`).
    fn login(
        &self,
        req: &LoginRequest,
    ) -> impl Future<Output = Result<TokenResponse, BackendError>> + Send;

    /// Fetches the profile of the token's owner (`GET /auth/me`).
    fn current_user(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<UserProfile, BackendError>> + Send;

    /// Asks whether the token is still accepted (`GET /auth/verify`).
    fn verify(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<VerifyResponse, BackendError>> + Send;

    /// Tells the backend the token is no longer in use
    /// (`POST /auth/logout`).
    ///
    /// Defaults to a no-op for backends without a logout endpoint.
    fn logout(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        let _ = token;
        async { Ok(()) }
    }
}
