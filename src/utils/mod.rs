//! Utility modules for the EPG logo cache
//!
//! This module contains reusable utilities that can be used
//! across different parts of the system.

pub mod retry;
pub mod url;

pub use retry::{RetryConfig, with_retry};
pub use url::UrlUtils;
