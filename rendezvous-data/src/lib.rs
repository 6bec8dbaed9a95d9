//! Adapters that connect the recommendation core to the outside world.
//!
//! - [`backend`] talks to the platform's HTTP API with `reqwest`.
//! - [`session`] persists the signed-in session as a JSON file.
#![forbid(unsafe_code)]

pub mod backend;
pub mod session;

pub use backend::{
    BackendBuildError, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, HttpBackend, HttpBackendConfig,
};
pub use session::FileSessionStore;
