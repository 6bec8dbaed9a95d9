//! Test doubles for the recommendation backend and session storage.
//!
//! [`StubBackend`] answers from pre-configured data and counts calls so tests
//! can assert that a fetch was skipped. [`MemorySessionStore`] keeps the
//! persisted session in memory.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    BackendError, EventId, EventRecord, RecommendationBackend, RecommendationQuery,
    RecommendationResponse, Session, SessionStore, SessionStoreError,
};

/// Deterministic [`RecommendationBackend`] for tests.
#[derive(Debug, Default)]
pub struct StubBackend {
    response: Option<Result<RecommendationResponse, BackendError>>,
    events: HashMap<EventId, EventRecord>,
    failing: HashSet<EventId>,
    delays: HashMap<EventId, Duration>,
    recommendation_calls: AtomicUsize,
    hydration_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubBackend {
    /// Answer recommendation requests with `response`.
    #[must_use]
    pub fn with_response(response: RecommendationResponse) -> Self {
        Self {
            response: Some(Ok(response)),
            ..Self::default()
        }
    }

    /// Fail recommendation requests with `error`.
    #[must_use]
    pub fn with_error(error: BackendError) -> Self {
        Self {
            response: Some(Err(error)),
            ..Self::default()
        }
    }

    /// Register a record returned by [`RecommendationBackend::event_by_id`].
    #[must_use]
    pub fn with_event(mut self, record: EventRecord) -> Self {
        self.events.insert(record.id.clone(), record);
        self
    }

    /// Make hydration of `id` fail with a network error.
    #[must_use]
    pub fn with_failing_event(mut self, id: impl Into<EventId>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Delay hydration of `id` by `delay`.
    #[must_use]
    pub fn with_delay(mut self, id: impl Into<EventId>, delay: Duration) -> Self {
        self.delays.insert(id.into(), delay);
        self
    }

    /// Number of recommendation requests received.
    #[must_use]
    pub fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }

    /// Number of hydration requests received.
    #[must_use]
    pub fn hydration_calls(&self) -> usize {
        self.hydration_calls.load(Ordering::SeqCst)
    }

    /// Most hydration requests that were ever running at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationBackend for StubBackend {
    async fn recommended_events(
        &self,
        _query: &RecommendationQuery,
    ) -> Result<RecommendationResponse, BackendError> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .unwrap_or_else(|| Ok(RecommendationResponse::default()))
    }

    async fn event_by_id(&self, id: &EventId) -> Result<Option<EventRecord>, BackendError> {
        self.hydration_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(BackendError::Network {
                url: format!("stub://events/{id}"),
                message: "stubbed failure".to_owned(),
            });
        }
        Ok(self.events.get(id).cloned())
    }
}

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    persisted: Mutex<Option<Session>>,
    corrupt: bool,
}

impl MemorySessionStore {
    /// Create a store already holding `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            persisted: Mutex::new(Some(session)),
            corrupt: false,
        }
    }

    /// Create a store whose persisted payload cannot be decoded.
    #[must_use]
    pub fn corrupt() -> Self {
        Self {
            persisted: Mutex::new(None),
            corrupt: true,
        }
    }

    /// Return the currently persisted session.
    #[must_use]
    pub fn persisted(&self) -> Option<Session> {
        self.persisted.lock().ok().and_then(|guard| guard.clone())
    }

    fn with_slot<T>(
        &self,
        apply: impl FnOnce(&mut Option<Session>) -> T,
    ) -> Result<T, SessionStoreError> {
        let mut guard = self
            .persisted
            .lock()
            .map_err(|err| SessionStoreError::Unavailable {
                location: "memory".to_owned(),
                message: err.to_string(),
            })?;
        Ok(apply(&mut guard))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionStoreError> {
        if self.corrupt {
            return Err(SessionStoreError::Corrupt {
                location: "memory".to_owned(),
                message: "stubbed corruption".to_owned(),
            });
        }
        self.with_slot(|slot| slot.clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.with_slot(|slot| *slot = Some(session.clone()))
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.with_slot(|slot| *slot = None)
    }
}
