//! Configuration default values
//!
//! This module contains all the default values for configuration options,
//! making them easily changeable in one central location.
use std::time::Duration;

// Storage defaults
pub const DEFAULT_SCHEDULES_DIR: &str = "schedule";
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded-images";
pub const DEFAULT_DAY_BUCKETS: [&str; 2] = ["today", "tomorrow"];

// Publishing defaults
pub const DEFAULT_BASE_URL: &str = "https://tv-programma.it/wp-content/uploads";
pub const DEFAULT_FALLBACK_LOGO_URL: &str =
    "https://tv-programma.it/wp-content/uploads/2026/02/sample-image.webp";

// Fetch defaults
pub const DEFAULT_WORKERS: usize = 32;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.2;
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_LOGO_BYTES: u64 = 5 * 1024 * 1024; // 5MB
pub const DEFAULT_USER_AGENT: &str = concat!("epg-logo-cache/", env!("CARGO_PKG_VERSION"));

// Transcode defaults
pub const DEFAULT_QUALITY: u8 = 80;

// Environment
pub const ENV_PREFIX: &str = "EPG_LOGO_CACHE_";
