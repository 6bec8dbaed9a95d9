//! Explicit session context for the signed-in user.
//!
//! The session is owned by a [`SessionContext`] that callers pass to whatever
//! needs it. It is hydrated from a [`SessionStore`] on start-up and cleared
//! from both memory and storage on logout.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Backend user identifier.
    pub user_id: String,
    /// Bearer token injected into backend requests.
    pub access_token: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Errors returned by [`Session::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The user identifier was blank.
    #[error("session user id must not be empty")]
    EmptyUserId,
    /// The access token was blank.
    #[error("session access token must not be empty")]
    EmptyAccessToken,
}

impl Session {
    /// Validate and construct a session.
    ///
    /// # Errors
    /// Returns [`SessionError`] when the user id or token is blank.
    pub fn new(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into().trim().to_owned();
        let access_token = access_token.into().trim().to_owned();
        if user_id.is_empty() {
            return Err(SessionError::EmptyUserId);
        }
        if access_token.is_empty() {
            return Err(SessionError::EmptyAccessToken);
        }
        Ok(Self {
            user_id,
            access_token,
            display_name: None,
        })
    }

    /// Attach a display name, consuming `self`.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Errors raised by [`SessionStore`] implementations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Reading the persisted session failed.
    #[error("failed to read session from {location}")]
    Read {
        /// Where the session is stored.
        location: String,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Writing or removing the persisted session failed.
    #[error("failed to write session to {location}")]
    Write {
        /// Where the session is stored.
        location: String,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The persisted payload could not be decoded.
    #[error("persisted session at {location} is corrupt: {message}")]
    Corrupt {
        /// Where the session is stored.
        location: String,
        /// Decoder message.
        message: String,
    },
    /// The store could not be accessed at all.
    #[error("session store {location} is unavailable: {message}")]
    Unavailable {
        /// Where the session is stored.
        location: String,
        /// Description of the failure.
        message: String,
    },
}

/// Persistent storage for the session.
pub trait SessionStore {
    /// Load the persisted session, if any.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when storage cannot be read or decoded.
    fn load(&self) -> Result<Option<Session>, SessionStoreError>;

    /// Persist `session`, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Remove the persisted session. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when storage cannot be written.
    fn clear(&self) -> Result<(), SessionStoreError>;
}

/// The signed-in user's session and the store backing it.
///
/// # Examples
///
/// ```
/// use std::sync::Mutex;
///
/// use rendezvous_core::{Session, SessionContext, SessionStore, SessionStoreError};
///
/// #[derive(Default)]
/// struct InMemory(Mutex<Option<Session>>);
///
/// # fn slot(store: &InMemory) -> std::sync::MutexGuard<'_, Option<Session>> {
/// #     store.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
/// # }
/// impl SessionStore for InMemory {
///     fn load(&self) -> Result<Option<Session>, SessionStoreError> {
///         Ok(slot(self).clone())
///     }
///
///     fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
///         *slot(self) = Some(session.clone());
///         Ok(())
///     }
///
///     fn clear(&self) -> Result<(), SessionStoreError> {
///         *slot(self) = None;
///         Ok(())
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut context = SessionContext::init(InMemory::default())?;
/// assert!(context.current().is_none());
///
/// context.sign_in(Session::new("u1", "token")?)?;
/// assert_eq!(context.user_id(), Some("u1"));
///
/// context.teardown()?;
/// assert!(context.current().is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionContext<S> {
    store: S,
    session: Option<Session>,
}

impl<S: SessionStore> SessionContext<S> {
    /// Hydrate the context from `store`.
    ///
    /// A corrupt persisted session is discarded and the user starts signed
    /// out.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when the store cannot be read, or when a
    /// corrupt session cannot be cleared.
    pub fn init(store: S) -> Result<Self, SessionStoreError> {
        let session = match store.load() {
            Ok(session) => session,
            Err(err @ SessionStoreError::Corrupt { .. }) => {
                warn!("discarding persisted session: {err}");
                store.clear()?;
                None
            }
            Err(err) => return Err(err),
        };
        if let Some(active) = &session {
            info!("restored session for user {}", active.user_id);
        }
        Ok(Self { store, session })
    }

    /// The active session, if signed in.
    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The active user's id, if signed in.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    /// The active bearer token, if signed in.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    /// Persist and activate `session`.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when the session cannot be persisted; the
    /// in-memory state is left unchanged in that case.
    pub fn sign_in(&mut self, session: Session) -> Result<(), SessionStoreError> {
        self.store.save(&session)?;
        info!("signed in as user {}", session.user_id);
        self.session = Some(session);
        Ok(())
    }

    /// Sign out: forget the session in memory and in storage.
    ///
    /// # Errors
    /// Returns [`SessionStoreError`] when storage cannot be cleared. The
    /// in-memory session is dropped regardless.
    pub fn teardown(&mut self) -> Result<(), SessionStoreError> {
        if let Some(previous) = self.session.take() {
            info!("signing out user {}", previous.user_id);
        }
        self.store.clear()
    }

    /// Borrow the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}
