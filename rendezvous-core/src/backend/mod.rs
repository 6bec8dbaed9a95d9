//! Access to the remote platform backend.
//!
//! The [`RecommendationBackend`] trait abstracts the two calls the
//! recommendation cycle makes: one request for scored candidates, then one
//! request per candidate to hydrate the full event record. The HTTP
//! implementation lives in `rendezvous-data`; tests use the `StubBackend`
//! behind the `test-support` feature.

mod error;
mod provider;

pub use error::BackendError;
pub use provider::RecommendationBackend;
