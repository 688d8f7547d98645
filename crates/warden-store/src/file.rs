//! JSON-file store.
//!
//! The whole store is one JSON object (`{"key": "value", ...}`) in a
//! single file. Writes go to a sibling temp file that is then renamed
//! over the original, so a crash mid-write leaves the old contents
//! intact. On unix the file is created with mode 0600: it holds a
//! bearer token.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{SessionStore, StoreError};

type Entries = BTreeMap<String, String>;

/// A [`SessionStore`] persisted as a JSON object in one file.
///
/// The file and its parent directory are created on first write. When
/// the last key is removed the file is deleted.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by `path`. Nothing is touched on disk yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads and parses the file. A missing file is an empty store.
    fn load(&self) -> Result<Entries, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Entries::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            StoreError::Corrupt(format!("{}: {e}", self.path.display()))
        })
    }

    /// Loads for modification. A corrupt file is replaced rather than
    /// blocking every future write.
    fn load_for_write(&self) -> Result<Entries, StoreError> {
        match self.load() {
            Err(StoreError::Corrupt(reason)) => {
                tracing::warn!(%reason, "discarding corrupt session store");
                Ok(Entries::new())
            }
            other => other,
        }
    }

    fn save(&self, entries: &Entries) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(self.io_error(e)),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp).map_err(|e| self.io_error(e))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut Entries),
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load_for_write()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.modify(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_owned(), (*value).to_owned());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
