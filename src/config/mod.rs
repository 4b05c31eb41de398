use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::models::LogoAssetFormat;
use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
}

/// Where schedule documents are read from and logos are cached to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root holding one directory per day bucket
    #[serde(default = "default_schedules_dir")]
    pub schedules_dir: PathBuf,
    /// Root of the logo cache; its final component is part of every public URL
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Day bucket directories processed in order
    #[serde(default = "default_day_buckets")]
    pub day_buckets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    /// Public URL the output root is served under (trailing slash stripped)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Logo written for shows whose asset could not be produced
    #[serde(default = "default_fallback_logo_url")]
    pub fallback_logo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Worker pool size
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bound on each individual request
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    /// Total download attempts per logo, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay", with = "duration_serde::duration")]
    pub initial_delay: Duration,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_delay", with = "duration_serde::duration")]
    pub max_delay: Duration,
    /// Responses larger than this are rejected without retry
    #[serde(default = "default_max_logo_bytes")]
    pub max_logo_bytes: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    #[serde(default)]
    pub format: LogoAssetFormat,
    /// Encoder quality (1-100); honoured by lossy formats
    #[serde(default = "default_quality")]
    pub quality: u8,
}

fn default_schedules_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEDULES_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_day_buckets() -> Vec<String> {
    DEFAULT_DAY_BUCKETS.iter().map(|d| d.to_string()).collect()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_fallback_logo_url() -> String {
    DEFAULT_FALLBACK_LOGO_URL.to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_initial_delay() -> Duration {
    DEFAULT_INITIAL_DELAY
}

fn default_backoff_multiplier() -> f64 {
    DEFAULT_BACKOFF_MULTIPLIER
}

fn default_max_delay() -> Duration {
    DEFAULT_MAX_DELAY
}

fn default_max_logo_bytes() -> u64 {
    DEFAULT_MAX_LOGO_BYTES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            schedules_dir: default_schedules_dir(),
            output_dir: default_output_dir(),
            day_buckets: default_day_buckets(),
        }
    }
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            fallback_logo_url: default_fallback_logo_url(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            request_timeout: default_request_timeout(),
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay: default_max_delay(),
            max_logo_bytes: default_max_logo_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            format: LogoAssetFormat::default(),
            quality: default_quality(),
        }
    }
}

impl Config {
    /// Load configuration: built-in defaults, then the TOML file (if present),
    /// then `EPG_LOGO_CACHE_<SECTION>__<KEY>` environment variables.
    pub fn load<P: AsRef<Path>>(config_file: P) -> AppResult<Self> {
        let config_file = config_file.as_ref();
        if config_file.exists() {
            info!("Loading configuration from {}", config_file.display());
        } else {
            debug!(
                "Configuration file {} not found, using defaults and environment",
                config_file.display()
            );
        }

        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Check settings and normalize the base URL
    pub fn validate(mut self) -> AppResult<Self> {
        let base_url = self.publishing.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(AppError::configuration("publishing.base_url must not be empty"));
        }
        self.publishing.base_url = base_url.to_string();

        if self.publishing.fallback_logo_url.trim().is_empty() {
            return Err(AppError::configuration(
                "publishing.fallback_logo_url must not be empty",
            ));
        }
        if self.storage.day_buckets.is_empty() {
            return Err(AppError::configuration(
                "storage.day_buckets must name at least one directory",
            ));
        }
        if self.fetch.workers == 0 {
            return Err(AppError::configuration("fetch.workers must be at least 1"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(AppError::configuration("fetch.max_attempts must be at least 1"));
        }
        if !(self.fetch.backoff_multiplier.is_finite() && self.fetch.backoff_multiplier > 0.0) {
            return Err(AppError::configuration(format!(
                "fetch.backoff_multiplier must be positive, got {}",
                self.fetch.backoff_multiplier
            )));
        }
        if !(1..=100).contains(&self.transcode.quality) {
            return Err(AppError::configuration(format!(
                "transcode.quality must be between 1 and 100, got {}",
                self.transcode.quality
            )));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.schedules_dir, PathBuf::from("schedule"));
        assert_eq!(config.storage.output_dir, PathBuf::from("downloaded-images"));
        assert_eq!(config.storage.day_buckets, vec!["today", "tomorrow"]);
        assert_eq!(config.fetch.workers, 32);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(20));
        assert_eq!(config.transcode.format, LogoAssetFormat::Webp);
        assert_eq!(config.transcode.quality, 80);
    }

    #[test]
    fn test_validate_strips_trailing_slash() {
        let mut config = Config::default();
        config.publishing.base_url = "https://cdn.example.com/uploads///".to_string();
        let config = config.validate().unwrap();
        assert_eq!(config.publishing.base_url, "https://cdn.example.com/uploads");
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut zero_workers = Config::default();
        zero_workers.fetch.workers = 0;
        assert!(matches!(
            zero_workers.validate(),
            Err(AppError::Configuration { .. })
        ));

        let mut bad_quality = Config::default();
        bad_quality.transcode.quality = 0;
        assert!(bad_quality.validate().is_err());

        let mut no_buckets = Config::default();
        no_buckets.storage.day_buckets.clear();
        assert!(no_buckets.validate().is_err());

        let mut slash_only = Config::default();
        slash_only.publishing.base_url = "/".to_string();
        assert!(slash_only.validate().is_err());
    }

    #[test]
    fn test_load_layers_file_and_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [storage]
                schedules_dir = "/srv/epg/schedule"

                [fetch]
                workers = 4
                request_timeout = "5s"

                [transcode]
                format = "png"
                "#,
            )?;
            jail.set_env("EPG_LOGO_CACHE_FETCH__WORKERS", "8");
            jail.set_env("EPG_LOGO_CACHE_PUBLISHING__BASE_URL", "https://cdn.example.com/");

            let config = Config::load("config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.storage.schedules_dir, PathBuf::from("/srv/epg/schedule"));
            assert_eq!(config.storage.output_dir, PathBuf::from("downloaded-images"));
            assert_eq!(config.fetch.workers, 8);
            assert_eq!(config.fetch.request_timeout, Duration::from_secs(5));
            assert_eq!(config.transcode.format, LogoAssetFormat::Png);
            assert_eq!(config.publishing.base_url, "https://cdn.example.com/");
            Ok(())
        });
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.fetch.workers, DEFAULT_WORKERS);
            assert_eq!(config.publishing.base_url, DEFAULT_BASE_URL);
            Ok(())
        });
    }
}
