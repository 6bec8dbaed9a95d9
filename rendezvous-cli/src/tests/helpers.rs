//! Test doubles shared by the CLI unit and behaviour tests.

use std::cell::RefCell;
use std::sync::Arc;

use rendezvous_core::test_support::StubBackend;
use rendezvous_core::{
    CONTENT_BASED, EventRecord, RecommendationBackend, RecommendationResponse, StrategyEntry,
    StrategyResult,
};

use crate::CliError;
use crate::recommend::{BackendBuilder, RecommendConfig};

/// Hands out a shared [`StubBackend`] and records the token it was given.
#[derive(Debug)]
pub(super) struct StubBackendBuilder {
    backend: Arc<StubBackend>,
    token: RefCell<Option<Option<String>>>,
}

impl StubBackendBuilder {
    pub(super) fn new(backend: StubBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            token: RefCell::new(None),
        }
    }

    pub(super) fn backend(&self) -> &StubBackend {
        &self.backend
    }

    /// Token passed to the last `build`; outer `None` if never built.
    pub(super) fn token(&self) -> Option<Option<String>> {
        self.token.borrow().clone()
    }
}

impl BackendBuilder for StubBackendBuilder {
    fn build(
        &self,
        _config: &RecommendConfig,
        access_token: Option<&str>,
    ) -> Result<Box<dyn RecommendationBackend>, CliError> {
        *self.token.borrow_mut() = Some(access_token.map(str::to_owned));
        Ok(Box::new(Arc::clone(&self.backend)))
    }
}

/// Backend proposing events 1 (0.4) and 2 (0.9) by content similarity.
pub(super) fn two_event_backend() -> StubBackend {
    StubBackend::with_response(RecommendationResponse::new(vec![StrategyResult::new(
        CONTENT_BASED,
        vec![StrategyEntry::new("1", 0.4), StrategyEntry::new("2", 0.9)],
    )]))
    .with_event(EventRecord::new(1_u64, "Hike"))
    .with_event(EventRecord::new(2_u64, "Quiz night"))
}
