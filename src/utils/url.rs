//! URL utilities for logo references and log output

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static SENSITIVE_QUERY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:username|password|user|pass|pwd|passwd)=)[^&]*")
        .expect("sensitive parameter pattern is valid")
});

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Whether a `show_logo` value can be used as a download source
    ///
    /// Plain prefix test: anything starting with `http` (after trimming) is a
    /// candidate. Values that pass but cannot be requested fail later as
    /// network errors and fall back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use epg_logo_cache::utils::url::UrlUtils;
    ///
    /// assert!(UrlUtils::is_remote_logo("https://img.example.com/a.jpg"));
    /// assert!(UrlUtils::is_remote_logo("  http://img.example.com/a.jpg "));
    /// assert!(!UrlUtils::is_remote_logo("/local/a.jpg"));
    /// assert!(!UrlUtils::is_remote_logo(""));
    /// ```
    pub fn is_remote_logo(url: &str) -> bool {
        url.trim().starts_with("http")
    }

    /// Join a base URL and path segments with single slashes
    ///
    /// ```rust
    /// use epg_logo_cache::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::join_segments("https://cdn.example.com/", &["logos", "rai-1", "today.webp"]),
    ///     "https://cdn.example.com/logos/rai-1/today.webp"
    /// );
    /// ```
    pub fn join_segments(base: &str, segments: &[&str]) -> String {
        let mut joined = base.trim_end_matches('/').to_string();
        for segment in segments {
            joined.push('/');
            joined.push_str(segment.trim_matches('/'));
        }
        joined
    }

    /// Obfuscate credentials in URLs for safe logging
    ///
    /// Replaces `user:pass@` authentication and common credential query
    /// parameters with `****`.
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        SENSITIVE_QUERY_PARAM
            .replace_all(&obfuscated, "${1}****")
            .to_string()
    }
}
