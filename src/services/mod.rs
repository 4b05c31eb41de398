//! Service layer
//!
//! Services own the orchestration of a run. They depend on the
//! [`LogoTransport`](logo_cache::LogoTransport) trait rather than a concrete
//! HTTP client, so the network can be substituted in tests.

pub mod logo_cache;

pub use logo_cache::{LogoRewriteService, RunSummary};
