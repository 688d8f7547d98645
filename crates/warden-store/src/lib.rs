//! Persistent key-value storage for Warden sessions.
//!
//! The session manager persists its state as a handful of string keys,
//! the same way a browser app would use `localStorage`. This crate
//! defines that contract ([`SessionStore`]) and two implementations:
//!
//! - [`MemoryStore`] — process-local map; tests and short-lived tools
//! - [`FileStore`] — a JSON object on disk; survives restarts
//!
//! A store is handed to the session manager by value at construction,
//! so nothing else in the process can write the session keys.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

/// A string key-value store.
///
/// Methods are synchronous: both implementations finish in
/// microseconds, and the session manager calls them while updating its
/// in-memory state, not across an `.await`.
///
/// `set_all` / `remove_all` apply several changes together. The
/// defaults loop over `set` / `remove`; stores that can apply a batch
/// in one write (like [`FileStore`]) override them.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the value for `key`, or `None` if it isn't set.
    ///
    /// # Errors
    /// [`StoreError::Io`] if the backing medium can't be read,
    /// [`StoreError::Corrupt`] if it can't be parsed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Sets `key` to `value`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Sets every `(key, value)` pair.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removes every key in `keys`.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
