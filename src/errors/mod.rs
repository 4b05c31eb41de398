//! Centralized error handling for the EPG logo cache
//!
//! Errors are split by the scope they are allowed to affect:
//!
//! - **Application Errors** ([`AppError`]): run-level failures. Only these are
//!   fatal, and only before any schedule document has been touched.
//! - **Fetch Errors** ([`FetchError`]): a single show's logo could not be
//!   produced. They are classified with [`FailureKind`] and demoted to the
//!   fallback logo for that show.
//! - **Document Errors** ([`DocumentError`]): a single schedule document could
//!   not be loaded or persisted. The document is left untouched and the run
//!   continues with the next one.
//!
//! # Usage
//!
//! ```rust
//! use epg_logo_cache::errors::{AppError, AppResult};
//!
//! fn check_workers(workers: usize) -> AppResult<usize> {
//!     if workers == 0 {
//!         return Err(AppError::configuration("worker pool size must be at least 1"));
//!     }
//!     Ok(workers)
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for per-document Results
pub type DocumentResult<T> = Result<T, DocumentError>;
