//! HTTP transport used to download logos
//!
//! The worker pool talks to the network only through [`LogoTransport`], so a
//! single client (and its connection pool) can be built once per run and
//! shared by every worker, and tests can substitute an in-memory fake.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::trace;

use crate::config::FetchConfig;
use crate::errors::{AppResult, FetchError};
use crate::utils::url::UrlUtils;

/// One bounded download attempt
#[async_trait]
pub trait LogoTransport: Send + Sync {
    /// Fetch the body of `url`. Non-2xx statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// Default transport backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_logo_bytes: u64,
}

impl ReqwestTransport {
    /// Build the process-wide client: per-request timeout, idle pool sized to
    /// the worker count
    pub fn new(config: &FetchConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.workers)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::with_client(client, config.max_logo_bytes))
    }

    pub fn with_client(client: Client, max_logo_bytes: u64) -> Self {
        Self {
            client,
            max_logo_bytes,
        }
    }
}

#[async_trait]
impl LogoTransport for ReqwestTransport {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        trace!("Requesting logo {}", UrlUtils::obfuscate_credentials(url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: UrlUtils::obfuscate_credentials(url),
            });
        }

        if let Some(length) = response.content_length()
            && length > self.max_logo_bytes
        {
            return Err(FetchError::TooLarge {
                size: length,
                limit: self.max_logo_bytes,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))
    }
}
