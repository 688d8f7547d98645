//! # Warden
//!
//! Client-side authentication sessions for apps that talk to a bearer
//! token auth service.
//!
//! Warden keeps one consistent answer to "who is signed in": it logs in
//! against the backend, persists the token so a restart can pick it up,
//! re-verifies it shortly before it expires, and tells subscribers about
//! every change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! # async fn run() -> Result<(), WardenError> {
//! warden::init_tracing();
//!
//! let warden = WardenBuilder::from_env()?
//!     .store(FileStore::new("session.json"))
//!     .build()?;
//!
//! let _sub = warden.subscribe(|s| println!("session is now {}", s.status));
//! warden.restore();
//! warden.login("bob", "hunter2").await?;
//!
//! // Attach to outgoing requests:
//! if let Some((name, value)) = warden.auth_header() {
//!     println!("{name}: {value}");
//! }
//! warden.logout();
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;

pub use builder::{Warden, WardenBuilder};
pub use error::WardenError;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG` (e.g. `RUST_LOG=warden_session=debug`)
/// and defaults to `info`. Does nothing if a global subscriber is
/// already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{Warden, WardenBuilder, WardenError};
    pub use warden_backend::{AuthBackend, BackendConfig, BackendError, HttpBackend};
    pub use warden_protocol::{UserId, UserProfile};
    pub use warden_session::{
        Session, SessionConfig, SessionError, SessionManager, SessionStatus,
        Subscription,
    };
    pub use warden_store::{FileStore, MemoryStore, SessionStore, StoreError};
}
