//! File-backed [`SessionStore`].
//!
//! The session is written as a single pretty-printed JSON document. A missing
//! file means nobody is signed in.

use std::io::{self, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rendezvous_core::{Session, SessionStore, SessionStoreError};
use rendezvous_fs::{open_utf8_file, remove_utf8_file, write_utf8_file};

/// Persists the session as JSON at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSessionStore {
    path: Utf8PathBuf,
}

impl FileSessionStore {
    /// Store the session at `path`. Parent directories are created on save.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.to_string()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        let file = match open_utf8_file(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no session file at {}", self.path);
                return Ok(None);
            }
            Err(source) => {
                return Err(SessionStoreError::Read {
                    location: self.location(),
                    source,
                });
            }
        };
        serde_json::from_reader(BufReader::new(file))
            .map(Some)
            .map_err(|err| SessionStoreError::Corrupt {
                location: self.location(),
                message: err.to_string(),
            })
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        let payload =
            serde_json::to_vec_pretty(session).map_err(|err| SessionStoreError::Unavailable {
                location: self.location(),
                message: err.to_string(),
            })?;
        write_utf8_file(&self.path, &payload).map_err(|source| SessionStoreError::Write {
            location: self.location(),
            source,
        })
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        remove_utf8_file(&self.path).map_err(|source| SessionStoreError::Write {
            location: self.location(),
            source,
        })
    }
}
