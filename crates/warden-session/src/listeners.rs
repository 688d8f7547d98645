//! Subscriber registry.
//!
//! Listeners are called synchronously, in no particular order, every
//! time the session changes. The registry lock is released before any
//! listener runs, so a listener may subscribe, unsubscribe, or read the
//! session manager without deadlocking.
//!
//! # Delivery order
//!
//! Changes are [`stage`](Registry::stage)d while the manager's state lock
//! is held, so the outbox always holds the newest snapshot. Whoever
//! calls [`flush`](Registry::flush) first becomes the dispatcher and
//! delivers until the outbox is empty; concurrent flushes return at
//! once. Snapshots staged while a delivery is running are coalesced,
//! and the last snapshot a listener sees always matches the manager.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::Session;

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

/// Opaque handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<SubscriptionId, Listener>>,
    outbox: Mutex<Outbox>,
}

#[derive(Default)]
struct Outbox {
    /// Newest snapshot not yet delivered.
    latest: Option<Session>,
    /// A flush is delivering right now.
    busy: bool,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn outbox(&self) -> MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        listener: Listener,
    ) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, listener);
        tracing::trace!(%id, "listener subscribed");
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::trace!(%id, "listener unsubscribed");
        }
        removed
    }

    /// Records `session` as the snapshot to deliver next, replacing any
    /// undelivered one. Call with the state lock held.
    pub(crate) fn stage(&self, session: Session) {
        self.outbox().latest = Some(session);
    }

    /// Delivers staged snapshots until none are left. Returns at once if
    /// another flush is already delivering; it will pick ours up.
    pub(crate) fn flush(&self) {
        {
            let mut outbox = self.outbox();
            if outbox.busy {
                return;
            }
            outbox.busy = true;
        }
        let _guard = FlushGuard(self);

        loop {
            let next = {
                let mut outbox = self.outbox();
                match outbox.latest.take() {
                    Some(session) => session,
                    None => {
                        outbox.busy = false;
                        return;
                    }
                }
            };
            self.notify(&next);
        }
    }

    /// Calls every listener with `session`.
    fn notify(&self, session: &Session) {
        let listeners: Vec<Listener> = self.lock().values().cloned().collect();
        for listener in listeners {
            listener(session);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Releases the dispatcher role if a listener panics mid-flush.
struct FlushGuard<'a>(&'a Registry);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.outbox().busy = false;
        }
    }
}

/// Returned by [`SessionManager::subscribe`](crate::SessionManager::subscribe).
///
/// Dropping a `Subscription` does NOT unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). Listeners registered for the life
/// of the app can simply drop the handle.
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the listener. Returns `false` if it was already gone
    /// (or the manager has been dropped).
    pub fn unsubscribe(self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.unsubscribe(self.id))
    }
}
