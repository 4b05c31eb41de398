//! Logo rewrite service
//!
//! Drives one run: discovers schedule documents under each day bucket, then
//! for each document groups its shows, fetches their logos through the shared
//! worker pool, rewrites every `show_logo` and atomically persists the result.
//! Only an unusable schedules root aborts the run; every other failure is
//! contained to the show or document it happened in.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dedup::ShowGroups;
use super::namer::{LogoNamer, channel_folder};
use super::persister::persist_document;
use super::rewriter::LogoRewriter;
use super::task::{FetchOutcome, FetchResult, FetchTask};
use super::transcode::LogoTranscoder;
use super::transport::LogoTransport;
use super::worker_pool::LogoFetchPool;
use crate::config::{Config, StorageConfig};
use crate::errors::{AppError, AppResult, DocumentError, DocumentResult};
use crate::models::ScheduleDocument;

/// What happened to one schedule document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Rewritten and persisted
    Rewritten,
    /// Could not be loaded; left untouched
    Skipped { reason: String },
    /// Rewritten in memory but could not be persisted; left untouched
    PersistFailed { reason: String },
}

/// Per-document outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub day: String,
    pub status: DocumentStatus,
    pub shows: usize,
    /// Shows with no usable source URL
    pub without_source: usize,
    pub fetched: usize,
    pub cached: usize,
    pub failed: usize,
    pub fallback: usize,
    pub entries_rewritten: usize,
}

impl DocumentReport {
    fn new(path: &Path, day: &str, status: DocumentStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            day: day.to_string(),
            status,
            shows: 0,
            without_source: 0,
            fetched: 0,
            cached: 0,
            failed: 0,
            fallback: 0,
            entries_rewritten: 0,
        }
    }

    fn skipped(path: &Path, day: &str, err: &DocumentError) -> Self {
        Self::new(
            path,
            day,
            DocumentStatus::Skipped {
                reason: err.to_string(),
            },
        )
    }

    fn tally<'a>(&mut self, results: impl IntoIterator<Item = &'a FetchResult>) {
        for result in results {
            match result.outcome {
                FetchOutcome::Cached => self.cached += 1,
                FetchOutcome::Fetched { .. } => self.fetched += 1,
                FetchOutcome::Failed { .. } => self.failed += 1,
            }
        }
    }
}

/// Totals across every document of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub documents_rewritten: usize,
    pub documents_skipped: usize,
    pub documents_failed: usize,
    pub shows_fetched: usize,
    pub shows_cached: usize,
    pub shows_failed: usize,
    pub shows_without_source: usize,
    pub entries_rewritten: usize,
    pub reports: Vec<DocumentReport>,
}

impl RunSummary {
    fn record(&mut self, report: DocumentReport) {
        match report.status {
            DocumentStatus::Rewritten => {
                self.documents_rewritten += 1;
                self.entries_rewritten += report.entries_rewritten;
            }
            DocumentStatus::Skipped { .. } => self.documents_skipped += 1,
            DocumentStatus::PersistFailed { .. } => self.documents_failed += 1,
        }
        self.shows_fetched += report.fetched;
        self.shows_cached += report.cached;
        self.shows_failed += report.failed;
        self.shows_without_source += report.without_source;
        self.reports.push(report);
    }

    pub fn documents_processed(&self) -> usize {
        self.reports.len()
    }
}

/// Writes a rewritten document back to its path
type DocumentWriter = fn(&Path, &ScheduleDocument) -> DocumentResult<()>;

pub struct LogoRewriteService {
    storage: StorageConfig,
    fallback_url: String,
    namer: LogoNamer,
    pool: LogoFetchPool,
    writer: DocumentWriter,
}

impl LogoRewriteService {
    /// Build the service from a validated configuration
    ///
    /// The transport is constructed by the caller and shared by every worker
    /// for the whole run.
    pub fn new(config: &Config, transport: Arc<dyn LogoTransport>) -> AppResult<Self> {
        let transcoder = LogoTranscoder::from(&config.transcode);
        let namer = LogoNamer::new(
            config.storage.output_dir.clone(),
            &config.publishing.base_url,
            transcoder.format(),
        )?;

        Ok(Self {
            storage: config.storage.clone(),
            fallback_url: config.publishing.fallback_logo_url.clone(),
            namer,
            pool: LogoFetchPool::new(transport, &config.fetch, transcoder),
            writer: persist_document,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_writer(mut self, writer: DocumentWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn namer(&self) -> &LogoNamer {
        &self.namer
    }

    /// Process every document under every configured day bucket
    pub async fn run(&self) -> AppResult<RunSummary> {
        let root = &self.storage.schedules_dir;
        let metadata = tokio::fs::metadata(root).await.map_err(|e| {
            AppError::configuration(format!(
                "schedules directory {} is not accessible: {}",
                root.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(AppError::configuration(format!(
                "schedules path {} is not a directory",
                root.display()
            )));
        }
        tokio::fs::read_dir(root).await.map_err(|e| {
            AppError::configuration(format!(
                "schedules directory {} is not readable: {}",
                root.display(),
                e
            ))
        })?;

        info!(
            "Rewriting show logos under {} with {} workers",
            root.display(),
            self.pool.workers()
        );

        // Every bucket is listed before the first document is touched
        let mut batches = Vec::with_capacity(self.storage.day_buckets.len());
        for day in &self.storage.day_buckets {
            let bucket = root.join(day);
            match list_documents(&bucket).await {
                Ok(documents) => {
                    debug!(
                        "Found {} schedule documents in {}",
                        documents.len(),
                        bucket.display()
                    );
                    batches.push((day, documents));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    info!("Day bucket {} does not exist, skipping", bucket.display());
                }
                Err(e) => {
                    return Err(AppError::configuration(format!(
                        "day bucket {} is not readable: {}",
                        bucket.display(),
                        e
                    )));
                }
            }
        }

        let mut summary = RunSummary::default();
        for (day, documents) in batches {
            for path in documents {
                summary.record(self.process_document(&path, day).await);
            }
        }

        info!(
            documents_rewritten = summary.documents_rewritten,
            documents_skipped = summary.documents_skipped,
            documents_failed = summary.documents_failed,
            shows_fetched = summary.shows_fetched,
            shows_cached = summary.shows_cached,
            shows_failed = summary.shows_failed,
            shows_without_source = summary.shows_without_source,
            "Logo rewrite finished: {} documents processed",
            summary.documents_processed()
        );
        Ok(summary)
    }

    /// Rewrite one document in place
    ///
    /// Never fails the run: load and persist problems are reported in the
    /// returned [`DocumentReport`] and the file on disk is left as it was.
    pub async fn process_document(&self, path: &Path, day: &str) -> DocumentReport {
        let Some(channel) = channel_folder(path) else {
            warn!("Skipping {}: file name is not valid UTF-8", path.display());
            return DocumentReport::new(
                path,
                day,
                DocumentStatus::Skipped {
                    reason: "file name is not valid UTF-8".to_string(),
                },
            );
        };

        let mut document = match load_document(path).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Skipping schedule document: {}", e);
                return DocumentReport::skipped(path, day, &e);
            }
        };

        let groups = ShowGroups::from_entries(&document.programs);
        let tasks: Vec<FetchTask> = groups
            .iter()
            .filter_map(|group| {
                group.source_url.as_ref().map(|url| FetchTask {
                    show_name: group.show_name.clone(),
                    source_url: url.clone(),
                    destination: self
                        .namer
                        .destination_path(&channel, day, &group.show_name),
                })
            })
            .collect();

        debug!(
            "{}: {} shows, {} to fetch",
            path.display(),
            groups.len(),
            tasks.len()
        );
        let task_count = tasks.len();
        let results = self.pool.run_batch(tasks).await;

        let rewriter = LogoRewriter::new(&self.namer, &self.fallback_url, &channel, day);
        let stats = rewriter.apply(&mut document, &groups, &results);

        let mut report = DocumentReport::new(path, day, DocumentStatus::Rewritten);
        report.shows = groups.len();
        report.without_source = groups.len() - task_count;
        report.fallback = stats.shows_fallback;
        report.entries_rewritten = stats.entries_rewritten;
        report.tally(results.values());

        if let Err(e) = save_document(self.writer, path, document).await {
            warn!("Leaving {} unchanged: {}", path.display(), e);
            report.status = DocumentStatus::PersistFailed {
                reason: e.to_string(),
            };
            return report;
        }

        info!(
            "Rewrote {} ({} shows: {} fetched, {} cached, {} fallback)",
            path.display(),
            report.shows,
            report.fetched,
            report.cached,
            report.fallback
        );
        report
    }
}

/// `*.json` files directly inside `bucket`, sorted by path
async fn list_documents(bucket: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(bucket).await?;
    let mut documents = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && entry.file_type().await?.is_file() {
            documents.push(path);
        }
    }

    documents.sort();
    Ok(documents)
}

async fn load_document(path: &Path) -> DocumentResult<ScheduleDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    ScheduleDocument::from_slice(&bytes).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

async fn save_document(
    writer: DocumentWriter,
    path: &Path,
    document: ScheduleDocument,
) -> DocumentResult<()> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || writer(&target, &document))
        .await
        .map_err(|e| DocumentError::Task {
            message: e.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::TempDir;

    struct UnreachableTransport;

    #[async_trait]
    impl LogoTransport for UnreachableTransport {
        async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
            Err(FetchError::InvalidRequest {
                url: url.to_string(),
                message: "offline".to_string(),
            })
        }
    }

    fn service(root: &Path) -> LogoRewriteService {
        let mut config = Config::default();
        config.storage.schedules_dir = root.join("schedule");
        config.storage.output_dir = root.join("downloaded-images");
        LogoRewriteService::new(&config, Arc::new(UnreachableTransport)).unwrap()
    }

    #[tokio::test]
    async fn test_lists_only_json_files_in_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let documents = list_documents(dir.path()).await.unwrap();
        assert_eq!(
            documents,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[tokio::test]
    async fn test_missing_bucket_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("schedule").join("today")).unwrap();

        let summary = service(dir.path()).run().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_root_that_is_a_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("schedule"), "").unwrap();

        let err = service(dir.path()).run().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_unlistable_bucket_is_fatal_before_any_document() {
        let dir = TempDir::new().unwrap();
        let schedule = dir.path().join("schedule");
        std::fs::create_dir_all(schedule.join("today")).unwrap();
        std::fs::write(schedule.join("tomorrow"), "").unwrap();
        let path = schedule.join("today").join("Rai-1.json");
        let original = r#"{"programs":[{"show_name":"News","show_logo":"http://x/n.jpg"}]}"#;
        std::fs::write(&path, original).unwrap();

        let err = service(dir.path()).run().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_root_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let schedule = dir.path().join("schedule");
        std::fs::create_dir_all(schedule.join("today")).unwrap();
        std::fs::set_permissions(&schedule, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to a privileged user
        let readable = std::fs::read_dir(&schedule).is_ok();
        let result = service(dir.path()).run().await;
        std::fs::set_permissions(&schedule, std::fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    fn refuse_broken(path: &Path, document: &ScheduleDocument) -> DocumentResult<()> {
        if path.file_name().is_some_and(|name| name == "Broken.json") {
            return Err(DocumentError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::other("disk full"),
            });
        }
        persist_document(path, document)
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_document_and_run_continues() {
        let dir = TempDir::new().unwrap();
        let today = dir.path().join("schedule").join("today");
        std::fs::create_dir_all(&today).unwrap();
        let document = r#"{"programs":[{"show_name":"News","show_logo":"http://x/n.jpg"}]}"#;
        let broken = today.join("Broken.json");
        let sibling = today.join("Rai-1.json");
        std::fs::write(&broken, document).unwrap();
        std::fs::write(&sibling, document).unwrap();

        let service = service(dir.path()).with_writer(refuse_broken);
        let summary = service.run().await.unwrap();

        assert_eq!(std::fs::read_to_string(&broken).unwrap(), document);
        let failed = summary.reports.iter().find(|r| r.path == broken).unwrap();
        assert!(matches!(failed.status, DocumentStatus::PersistFailed { .. }));
        assert_eq!(summary.documents_failed, 1);
        assert_eq!(summary.documents_rewritten, 1);

        let rewritten =
            ScheduleDocument::from_slice(&std::fs::read(&sibling).unwrap()).unwrap();
        assert_eq!(
            rewritten.programs[0].show_logo(),
            service.fallback_url.as_str()
        );
    }

    #[tokio::test]
    async fn test_report_counts() {
        let dir = TempDir::new().unwrap();
        let today = dir.path().join("schedule").join("today");
        std::fs::create_dir_all(&today).unwrap();
        let path = today.join("Rai-1.json");
        std::fs::write(
            &path,
            r#"{"channel_name":"Rai 1","date":"2026-01-26","programs":[
                {"show_name":"News","show_logo":"http://x/n.jpg"},
                {"show_name":"News","show_logo":""},
                {"show_name":"Meteo","show_logo":""},
                {"show_name":"","show_logo":"http://x/a.jpg"}]}"#,
        )
        .unwrap();

        let report = service(dir.path()).process_document(&path, "today").await;
        assert_eq!(report.status, DocumentStatus::Rewritten);
        assert_eq!(report.shows, 2);
        assert_eq!(report.without_source, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.fallback, 2);
        assert_eq!(report.entries_rewritten, 3);
    }
}
