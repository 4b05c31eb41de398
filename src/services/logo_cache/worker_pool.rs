//! Bounded pool of logo download workers
//!
//! A batch is pre-loaded into a task queue; `workers` tasks drain it
//! concurrently and report one [`FetchResult`] per show. [`LogoFetchPool::run_batch`]
//! returns only after every worker has finished, so the caller never sees a
//! partial batch.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use super::persister::store_asset;
use super::task::{FetchOutcome, FetchResult, FetchTask};
use super::transcode::LogoTranscoder;
use super::transport::LogoTransport;
use crate::config::FetchConfig;
use crate::errors::FetchError;
use crate::utils::retry::{RetryConfig, with_retry};
use crate::utils::url::UrlUtils;

/// Runs one task at a time; shared by all workers of a pool
struct FetchWorker {
    transport: Arc<dyn LogoTransport>,
    retry: RetryConfig,
    transcoder: LogoTranscoder,
    max_logo_bytes: u64,
}

impl FetchWorker {
    async fn process(&self, task: FetchTask) -> FetchResult {
        let outcome = match self.produce(&task).await {
            Ok(outcome) => {
                trace!("Logo for '{}': {}", task.show_name, outcome);
                outcome
            }
            Err(err) => {
                warn!(
                    show = %task.show_name,
                    kind = %err.kind(),
                    "Logo unavailable for '{}' from {}: {}",
                    task.show_name,
                    UrlUtils::obfuscate_credentials(&task.source_url),
                    err
                );
                FetchOutcome::failed(&err)
            }
        };

        FetchResult::new(task, outcome)
    }

    async fn produce(&self, task: &FetchTask) -> Result<FetchOutcome, FetchError> {
        // Presence alone marks the asset as valid
        if tokio::fs::try_exists(&task.destination)
            .await
            .unwrap_or(false)
        {
            return Ok(FetchOutcome::Cached);
        }

        let body = with_retry(
            &self.retry,
            || self.transport.fetch(&task.source_url),
            &format!("fetch logo '{}'", task.show_name),
        )
        .await?;

        let size = body.len() as u64;
        if size > self.max_logo_bytes {
            return Err(FetchError::TooLarge {
                size,
                limit: self.max_logo_bytes,
            });
        }

        let transcoder = self.transcoder;
        let encoded = tokio::task::spawn_blocking(move || transcoder.transcode(&body))
            .await
            .map_err(|e| FetchError::Decode {
                message: format!("transcode task aborted: {e}"),
            })??;

        let destination = task.destination.clone();
        tokio::task::spawn_blocking(move || store_asset(&destination, &encoded))
            .await
            .map_err(|e| FetchError::Storage {
                path: task.destination.clone(),
                source: io::Error::other(e),
            })??;

        debug!(
            "Cached logo for '{}' at {}",
            task.show_name,
            task.destination.display()
        );
        Ok(FetchOutcome::Fetched {
            bytes_downloaded: size,
        })
    }
}

/// Fixed-size worker pool shared by every document of a run
pub struct LogoFetchPool {
    worker: Arc<FetchWorker>,
    workers: usize,
}

impl LogoFetchPool {
    pub fn new(
        transport: Arc<dyn LogoTransport>,
        config: &FetchConfig,
        transcoder: LogoTranscoder,
    ) -> Self {
        Self {
            worker: Arc::new(FetchWorker {
                transport,
                retry: RetryConfig::from(config),
                transcoder,
                max_logo_bytes: config.max_logo_bytes,
            }),
            workers: config.workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every task and wait for all of them
    ///
    /// Results are keyed by show name. A task whose worker died without
    /// reporting is simply absent from the map.
    pub async fn run_batch(&self, tasks: Vec<FetchTask>) -> HashMap<String, FetchResult> {
        let task_count = tasks.len();
        if task_count == 0 {
            return HashMap::new();
        }

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        for task in tasks {
            if task_tx.send(task).is_err() {
                break;
            }
        }
        // Closing the queue lets idle workers exit once it is drained
        drop(task_tx);

        let queue = Arc::new(Mutex::new(task_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let worker_count = self.workers.min(task_count);
        debug!(
            "Dispatching {} logo tasks to {} workers",
            task_count, worker_count
        );

        let mut join_set = JoinSet::new();
        for worker_id in 0..worker_count {
            let worker = Arc::clone(&self.worker);
            let queue = Arc::clone(&queue);
            let results = result_tx.clone();

            join_set.spawn(async move {
                loop {
                    // The queue is filled and closed before any worker starts
                    let next = queue.lock().await.try_recv().ok();
                    let Some(task) = next else {
                        break;
                    };
                    if results.send(worker.process(task).await).is_err() {
                        break;
                    }
                }
                trace!("Logo worker {} finished", worker_id);
            });
        }
        drop(result_tx);

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                error!("Logo worker terminated abnormally: {}", e);
            }
        }

        let mut results = HashMap::with_capacity(task_count);
        while let Ok(result) = result_rx.try_recv() {
            results.insert(result.show_name.clone(), result);
        }
        results
    }
}
