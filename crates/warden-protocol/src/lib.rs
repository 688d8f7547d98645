//! Wire protocol for Warden.
//!
//! This crate defines the "language" spoken between the session manager
//! and the auth backend, plus the format used to persist a session:
//!
//! - **Types** ([`LoginRequest`], [`TokenResponse`], [`UserProfile`],
//!   [`VerifyResponse`], [`ErrorBody`]) — the JSON bodies exchanged with
//!   the backend's `/auth/*` endpoints.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those values are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! ```text
//! Backend (HTTP bytes) → Protocol (typed bodies) → Session (auth state)
//! ```
//!
//! The protocol layer knows nothing about HTTP or storage. It only knows
//! the shape of the messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ErrorBody, ErrorDetail, LoginRequest, TokenResponse, UserId,
    UserProfile, ValidationIssue, VerifyResponse,
};
