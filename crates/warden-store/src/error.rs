use std::path::PathBuf;

/// Errors that can occur while reading or writing a [`SessionStore`](crate::SessionStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file couldn't be read or written.
    #[error("store i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing medium holds data that isn't a string map.
    #[error("store is corrupt: {0}")]
    Corrupt(String),
}
