//! Show-logo cache rewriting
//!
//! Turns remote `show_logo` references in schedule documents into locally
//! cached, normalized assets:
//!
//! - [`ShowGroups`] collapses a document's entries into one group per show
//! - [`LogoFetchPool`] probes the cache and downloads/transcodes missing logos
//! - [`LogoRewriter`] writes the public asset URL (or the fallback) to every entry
//! - [`persister`] commits documents and assets with atomic replacement

pub mod dedup;
pub mod namer;
pub mod persister;
pub mod rewriter;
pub mod service;
pub mod task;
pub mod transcode;
pub mod transport;
pub mod worker_pool;

pub use dedup::{ShowGroup, ShowGroups};
pub use namer::{LogoNamer, slugify};
pub use rewriter::{LogoRewriter, RewriteStats};
pub use service::{DocumentReport, DocumentStatus, LogoRewriteService, RunSummary};
pub use task::{FetchOutcome, FetchResult, FetchTask};
pub use transcode::LogoTranscoder;
pub use transport::{LogoTransport, ReqwestTransport};
pub use worker_pool::LogoFetchPool;
