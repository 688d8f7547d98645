//! Client-side authentication session management for Warden.
//!
//! This crate owns the answer to "who is signed in, and with what
//! token":
//!
//! 1. **Login / logout** against an [`AuthBackend`](warden_backend::AuthBackend)
//! 2. **Persistence** of the token, user and expiry in a
//!    [`SessionStore`](warden_store::SessionStore), so a restart can
//!    [`restore`](SessionManager::restore) the session
//! 3. **Refresh**: a background re-verification shortly before expiry
//! 4. **Change notification** for UIs via [`SessionManager::subscribe`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← reads auth_header(), subscribes to changes
//!     ↕
//! Session Layer (this crate)  ← state machine, persistence, refresh
//!     ↕
//! Backend / Store / Timer (below)  ← HTTP, key-value storage, tokio tasks
//! ```

mod error;
mod listeners;
mod manager;
mod persist;
mod session;

pub use error::{SessionError, LOGIN_FAILED_FALLBACK};
pub use listeners::{Subscription, SubscriptionId};
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionStatus, AUTHORIZATION};
