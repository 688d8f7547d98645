//! The session manager: the single source of truth for "who is signed in".
//!
//! It is responsible for:
//! - Restoring a persisted session at startup
//! - Logging in against the auth backend and persisting the result
//! - Re-verifying the token shortly before it expires
//! - Logging out (locally, and optionally on the backend)
//! - Telling subscribers about every change
//!
//! # Concurrency note
//!
//! `SessionManager` is a cheap `Clone` handle around an `Arc`. All
//! mutable state lives behind one `std::sync::Mutex` that is only held
//! for short, synchronous sections: never across an `.await`, and never
//! while a listener runs. The only suspension points are the backend
//! round-trips inside `login` and `verify`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use warden_backend::AuthBackend;
use warden_protocol::{Codec, JsonCodec, LoginRequest};
use warden_store::SessionStore;
use warden_timer::{now_millis, refresh_delay, RefreshTimer};

use crate::listeners::Registry;
use crate::persist::{self, LoadError, StorageKeys};
use crate::session::Credentials;
use crate::{Session, SessionConfig, SessionError, SessionStatus, Subscription};

/// Owns the client's authentication state.
///
/// ## Lifecycle
///
/// ```text
/// restore() ──→ [Authenticated] ──(timer: verify fails)──→ [Anonymous]
///     │               ↑    │
///     │        login()│    └──(logout)──────────────────→ [Anonymous]
///     ▼               │
/// [Anonymous] ──→ [Authenticating] ──(error)──→ [Anonymous]
/// ```
///
/// Construct one per application and share it by cloning. There is no
/// global instance.
pub struct SessionManager<B, S, C = JsonCodec> {
    inner: Arc<Inner<B, S, C>>,
}

impl<B, S, C> Clone for SessionManager<B, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<B, S, C> {
    backend: B,
    /// Only this manager writes the session keys: the store was moved
    /// in at construction.
    store: S,
    codec: C,
    config: SessionConfig,
    keys: StorageKeys,
    state: Mutex<State>,
    listeners: Arc<Registry>,
}

#[derive(Default)]
struct State {
    credentials: Option<Credentials>,
    /// `true` while a `login` is waiting on the backend.
    authenticating: bool,
    /// The single pending refresh, if any.
    timer: Option<RefreshTimer>,
    /// Bumped on every arm; a firing timer whose generation is stale
    /// has been superseded and does nothing.
    timer_generation: u64,
    /// Bumped by every logout; a login that sees a different epoch on
    /// completion was cancelled.
    epoch: u64,
    /// Set when a background verification ends the session.
    expired: bool,
}

impl State {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

impl<B, S> SessionManager<B, S, JsonCodec>
where
    B: AuthBackend,
    S: SessionStore,
{
    /// Creates an empty (anonymous) manager. Call
    /// [`restore`](Self::restore) to pick up a persisted session.
    pub fn new(backend: B, store: S, config: SessionConfig) -> Self {
        Self::with_codec(backend, store, JsonCodec, config)
    }
}

impl<B, S, C> SessionManager<B, S, C>
where
    B: AuthBackend,
    S: SessionStore,
    C: Codec,
{
    /// Like [`new`](SessionManager::new) with a custom codec for the
    /// persisted user profile.
    pub fn with_codec(backend: B, store: S, codec: C, config: SessionConfig) -> Self {
        let keys = StorageKeys::new(&config.storage_prefix);
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                codec,
                config,
                keys,
                state: Mutex::new(State::default()),
                listeners: Arc::new(Registry::default()),
            }),
        }
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The backend this manager talks to.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> Session {
        self.snapshot(&self.lock())
    }

    pub fn status(&self) -> SessionStatus {
        self.session().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// `true` while a refresh timer is armed.
    pub fn has_pending_refresh(&self) -> bool {
        self.lock()
            .timer
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// The `Authorization` header for the current token, or `None` when
    /// not authenticated. Never fails.
    pub fn auth_header(&self) -> Option<(&'static str, String)> {
        self.session().auth_header()
    }

    /// Just the header value (`"Bearer <token>"`).
    pub fn authorization_value(&self) -> Option<String> {
        self.auth_header().map(|(_, value)| value)
    }

    /// Returns `true` once after a background verification ended the
    /// session, then resets.
    pub fn take_expired(&self) -> bool {
        std::mem::take(&mut self.lock().expired)
    }

    // =====================================================================
    // subscribe()
    // =====================================================================

    /// Registers `listener` to be called with the resolved session on
    /// every state change.
    ///
    /// Listeners run synchronously inside the operation that changed
    /// the state, after the internal lock is released. Order between
    /// listeners is unspecified. When several threads change the session
    /// at once, intermediate states may be skipped, but the last
    /// notification always matches the current session.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(Arc::new(listener))
    }

    // =====================================================================
    // restore()
    // =====================================================================

    /// Adopts the persisted session, if there is a valid one.
    ///
    /// A complete, parseable, unexpired triple becomes the current
    /// session and gets a refresh timer. Anything else (missing keys,
    /// corrupt values, an expired triple, an unreadable store) is
    /// treated as "no session": the keys are wiped and any session held
    /// in memory is dropped. Never fails. Safe to call more than once.
    pub fn restore(&self) -> Session {
        let now = now_millis();
        let loaded = persist::load(
            &self.inner.store,
            &self.inner.codec,
            &self.inner.keys,
            now,
        );

        match loaded {
            Ok(credentials) => {
                let snapshot = {
                    let mut state = self.lock();
                    tracing::info!(
                        user = %credentials.user.username,
                        expires_at = credentials.expires_at,
                        "restored persisted session"
                    );
                    state.credentials = Some(credentials);
                    state.expired = false;
                    self.schedule_refresh_locked(&mut state);
                    self.publish(&state)
                };
                self.inner.listeners.flush();
                snapshot
            }
            Err(reason) => {
                match &reason {
                    LoadError::Empty => {
                        tracing::debug!("no persisted session to restore");
                    }
                    LoadError::Expired { .. } => {
                        tracing::info!(%reason, "persisted session expired");
                    }
                    _ => {
                        tracing::warn!(%reason, "discarding persisted session");
                    }
                }
                let snapshot = {
                    let mut state = self.lock();
                    self.clear_store();
                    if state.credentials.take().is_some() {
                        state.cancel_timer();
                        self.publish(&state)
                    } else {
                        self.snapshot(&state)
                    }
                };
                self.inner.listeners.flush();
                snapshot
            }
        }
    }

    // =====================================================================
    // login()
    // =====================================================================

    /// Signs in with `username` / `password`.
    ///
    /// Status goes to `Authenticating` (subscribers are told), then the
    /// backend's login and current-user endpoints are called. On success
    /// the session is persisted, a refresh is scheduled, and the new
    /// session is returned. On failure the in-memory session is cleared,
    /// storage is left untouched, and the error is returned.
    ///
    /// # Errors
    /// - [`SessionError::LoginInProgress`] — another login is pending
    /// - [`SessionError::Rejected`] — the backend refused; the message is
    ///   the backend's `detail` (or a generic fallback)
    /// - [`SessionError::Transport`] / [`SessionError::Malformed`] — the
    ///   backend was unreachable or answered nonsense
    /// - [`SessionError::Cancelled`] — `logout` ran before the backend
    ///   answered
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let epoch = {
            let mut state = self.lock();
            if state.authenticating {
                tracing::debug!(username, "login rejected: another login in flight");
                return Err(SessionError::LoginInProgress);
            }
            state.authenticating = true;
            state.credentials = None;
            state.cancel_timer();
            self.publish(&state);
            state.epoch
        };
        self.inner.listeners.flush();
        tracing::info!(username, "login started");

        let outcome = self.authenticate(username, password).await;

        let (result, snapshot) = {
            let mut state = self.lock();
            if state.epoch != epoch {
                tracing::info!(username, "login finished after logout; discarding");
                return Err(SessionError::Cancelled);
            }
            state.authenticating = false;

            let result = match outcome {
                Ok(credentials) => {
                    if let Err(e) = persist::save(
                        &self.inner.store,
                        &self.inner.codec,
                        &self.inner.keys,
                        &credentials,
                    ) {
                        tracing::warn!(
                            error = %e,
                            "could not persist session; it will not survive a restart"
                        );
                    }
                    tracing::info!(
                        user = %credentials.user.username,
                        expires_at = credentials.expires_at,
                        "login succeeded"
                    );
                    state.credentials = Some(credentials);
                    state.expired = false;
                    self.schedule_refresh_locked(&mut state);
                    Ok(())
                }
                Err(e) => {
                    tracing::info!(username, error = %e, "login failed");
                    state.credentials = None;
                    Err(e)
                }
            };
            (result, self.publish(&state))
        };

        self.inner.listeners.flush();
        result.map(|()| snapshot)
    }

    /// The network half of `login`: token, then profile.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Credentials, SessionError> {
        let request = LoginRequest::new(username, password);
        let token = self.inner.backend.login(&request).await?;
        token
            .validate()
            .map_err(|e| SessionError::Malformed(e.to_string()))?;

        let user = self.inner.backend.current_user(&token.access_token).await?;

        let ttl = token
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(self.inner.config.default_ttl);
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Ok(Credentials {
            token: token.access_token,
            user,
            expires_at: now_millis().saturating_add(ttl_ms),
        })
    }

    // =====================================================================
    // verify()
    // =====================================================================

    /// Asks the backend whether the current token is still valid.
    ///
    /// Returns `false` without a request when there is no token, and
    /// `false` when the backend can't be reached or answers with an
    /// error. Does not change the session; acting on a `false` (usually
    /// by calling [`logout`](Self::logout)) is up to the caller. See
    /// [`verify_or_logout`](Self::verify_or_logout).
    pub async fn verify(&self) -> bool {
        let token = self.current_token();
        match token {
            Some(token) => self.verify_token(&token).await,
            None => false,
        }
    }

    /// [`verify`](Self::verify), then [`logout`](Self::logout) if it
    /// failed. Returns the verification result.
    pub async fn verify_or_logout(&self) -> bool {
        let valid = self.verify().await;
        if !valid {
            self.logout();
        }
        valid
    }

    /// Makes sure the session is still good before using it.
    ///
    /// - not signed in → `false`, no request
    /// - token past its expiry → session ended, `false`
    /// - inside the refresh window (no timer armed) → verify, logging
    ///   out on failure
    /// - otherwise → `true`, no request
    pub async fn ensure_fresh(&self) -> bool {
        // Ok(needs_verify), or Err(token) when the token has expired.
        let check = {
            let state = self.lock();
            match &state.credentials {
                None => return false,
                Some(c) if !c.is_live(now_millis()) => Err(c.token.clone()),
                Some(_) => Ok(state.timer.is_none()),
            }
        };

        match check {
            Err(token) => {
                tracing::info!("session expired before use");
                self.end_session(true, Some(&token));
                false
            }
            Ok(true) => self.verify_or_logout().await,
            Ok(false) => true,
        }
    }

    async fn verify_token(&self, token: &str) -> bool {
        match self.inner.backend.verify(token).await {
            Ok(verdict) => {
                if !verdict.valid {
                    tracing::info!("backend reports token invalid");
                }
                verdict.valid
            }
            Err(e) => {
                tracing::warn!(error = %e, "token verification failed");
                false
            }
        }
    }

    // =====================================================================
    // schedule_refresh()
    // =====================================================================

    /// Re-arms the refresh timer for the current session.
    fn schedule_refresh(&self) {
        let mut state = self.lock();
        self.schedule_refresh_locked(&mut state);
    }

    /// Cancels any pending timer, then arms a new one `refresh_lead`
    /// before expiry. Inside the window (or without a session) nothing
    /// is armed.
    fn schedule_refresh_locked(&self, state: &mut State) {
        state.cancel_timer();

        let Some(credentials) = &state.credentials else {
            return;
        };
        let Some(delay) = refresh_delay(
            credentials.expires_at,
            now_millis(),
            self.inner.config.refresh_lead,
        ) else {
            tracing::debug!(
                expires_at = credentials.expires_at,
                "session inside refresh window; verify on next use"
            );
            return;
        };

        state.timer_generation += 1;
        let generation = state.timer_generation;
        // Weak: the timer must not keep the manager alive.
        let weak = Arc::downgrade(&self.inner);
        state.timer = RefreshTimer::arm(delay, async move {
            if let Some(inner) = weak.upgrade() {
                SessionManager { inner }.refresh_due(generation).await;
            }
        });
    }

    /// Body of the refresh timer.
    async fn refresh_due(&self, generation: u64) {
        let token = {
            let mut state = self.lock();
            if state.timer_generation != generation {
                return;
            }
            // Release our own handle so nothing below aborts this task.
            if let Some(timer) = state.timer.take() {
                timer.disarm();
            }
            match &state.credentials {
                Some(c) => c.token.clone(),
                None => return,
            }
        };

        tracing::debug!("running scheduled re-verification");
        if self.verify_token(&token).await {
            tracing::debug!("scheduled re-verification ok");
            return;
        }

        // Only end the session we verified; a new login may have
        // replaced it while the request was out.
        if self.end_session(true, Some(&token)) {
            tracing::info!("session expired; logged out");
        }
    }

    // =====================================================================
    // logout()
    // =====================================================================

    /// Ends the session: cancels the refresh timer, clears memory and
    /// storage, and notifies subscribers with the anonymous session.
    ///
    /// A login still waiting on the backend is cancelled (its result is
    /// discarded). With [`SessionConfig::remote_logout`] the backend is
    /// told too, fire-and-forget. Idempotent.
    pub fn logout(&self) {
        self.end_session(false, None);
    }

    /// Ends the session. With `only_token`, does nothing (and returns
    /// `false`) unless that token is still the current one; the check
    /// and the teardown share one critical section.
    fn end_session(&self, expired: bool, only_token: Option<&str>) -> bool {
        let token = {
            let mut state = self.lock();
            if let Some(expected) = only_token {
                let current = state.credentials.as_ref().map(|c| c.token.as_str());
                if current != Some(expected) {
                    tracing::debug!("session changed since it was checked; keeping it");
                    return false;
                }
            }
            state.cancel_timer();
            state.authenticating = false;
            state.epoch += 1;
            if expired {
                state.expired = true;
            }
            let token = state.credentials.take().map(|c| c.token);
            // Under the lock so a login finishing right now can't
            // interleave its save with this clear.
            self.clear_store();
            self.publish(&state);
            token
        };

        if token.is_some() {
            tracing::info!(expired, "logged out");
        }
        self.inner.listeners.flush();

        if let Some(token) = token.filter(|_| self.inner.config.remote_logout) {
            self.spawn_remote_logout(token);
        }
        true
    }

    fn spawn_remote_logout(&self, token: String) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("no tokio runtime; skipping remote logout");
            return;
        };
        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move {
            if let Err(e) = inner.backend.logout(&token).await {
                tracing::debug!(error = %e, "remote logout failed (ignored)");
            }
        });
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    // A listener or timer panicking can't leave `State` half-written
    // (every mutation completes before user code runs), so poisoning
    // is ignored.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolves the snapshot and stages it for delivery. Call with the
    /// state lock held, then `flush` once it is released.
    fn publish(&self, state: &State) -> Session {
        let snapshot = self.snapshot(state);
        self.inner.listeners.stage(snapshot.clone());
        snapshot
    }

    fn snapshot(&self, state: &State) -> Session {
        Session::resolve(
            state.credentials.as_ref(),
            state.authenticating,
            now_millis(),
        )
    }

    fn current_token(&self) -> Option<String> {
        self.lock().credentials.as_ref().map(|c| c.token.clone())
    }

    fn clear_store(&self) {
        if let Err(e) = persist::clear(&self.inner.store, &self.inner.keys) {
            tracing::warn!(error = %e, "could not clear persisted session");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
