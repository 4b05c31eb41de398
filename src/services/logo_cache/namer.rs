//! Deterministic naming of cached logo assets
//!
//! An asset's location depends only on the show name, the output root, the
//! channel folder and the day bucket. Re-running against the same inputs
//! therefore always probes (and publishes) the same path.

use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::models::LogoAssetFormat;
use crate::utils::url::UrlUtils;

/// Slug used when a show name has no `[a-z0-9]` characters at all
pub const PLACEHOLDER_SLUG: &str = "unknown";

/// Convert a show name into a filesystem-safe slug
///
/// Lower-cases the name, collapses every run of characters outside
/// `[a-z0-9]` into a single `-` and trims leading/trailing separators.
///
/// ```rust
/// use epg_logo_cache::services::logo_cache::namer::slugify;
///
/// assert_eq!(slugify("South Park"), "south-park");
/// assert_eq!(slugify("  C.S.I.: Miami!! "), "c-s-i-miami");
/// assert_eq!(slugify("???"), "unknown");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        slug
    }
}

/// Maps show names to cache paths and public URLs
#[derive(Debug, Clone)]
pub struct LogoNamer {
    output_root: PathBuf,
    output_root_name: String,
    base_url: String,
    format: LogoAssetFormat,
}

impl LogoNamer {
    /// Create a namer for the given cache root
    ///
    /// The final path component of `output_root` is part of every public URL,
    /// so a root without one (such as `/`) is a configuration error.
    pub fn new<P: Into<PathBuf>>(
        output_root: P,
        base_url: &str,
        format: LogoAssetFormat,
    ) -> AppResult<Self> {
        let output_root = output_root.into();
        let output_root_name = Self::root_name(&output_root).ok_or_else(|| {
            AppError::configuration(format!(
                "output directory {} has no usable final path component",
                output_root.display()
            ))
        })?;

        Ok(Self {
            output_root,
            output_root_name,
            base_url: base_url.trim_end_matches('/').to_string(),
            format,
        })
    }

    fn root_name(output_root: &Path) -> Option<String> {
        let name = match output_root.file_name() {
            Some(name) => name.to_os_string(),
            None => std::path::absolute(output_root)
                .ok()?
                .components()
                .filter_map(|c| match c {
                    std::path::Component::Normal(part) => Some(part.to_os_string()),
                    _ => None,
                })
                .next_back()?,
        };
        name.to_str().map(str::to_string)
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn format(&self) -> LogoAssetFormat {
        self.format
    }

    /// `{slug}.{ext}` for a show
    pub fn file_name(&self, show_name: &str) -> String {
        format!("{}.{}", slugify(show_name), self.format.extension())
    }

    /// Directory holding every asset of one channel and day
    pub fn channel_dir(&self, channel_folder: &str, day: &str) -> PathBuf {
        self.output_root.join(channel_folder).join(day)
    }

    /// `{out_root}/{channel_folder}/{day}/{slug}.{ext}`
    pub fn destination_path(&self, channel_folder: &str, day: &str, show_name: &str) -> PathBuf {
        self.channel_dir(channel_folder, day)
            .join(self.file_name(show_name))
    }

    /// `{base_url}/{out_root_name}/{channel_folder}/{day}/{slug}.{ext}`
    pub fn public_url(&self, channel_folder: &str, day: &str, show_name: &str) -> String {
        UrlUtils::join_segments(
            &self.base_url,
            &[
                &self.output_root_name,
                channel_folder,
                day,
                &self.file_name(show_name),
            ],
        )
    }
}

/// Channel folder for a schedule document: its file stem
///
/// The loader locates documents by this identity, so cached assets are keyed
/// by it as well rather than by the `channel_name` text inside the document.
pub fn channel_folder(document_path: &Path) -> Option<String> {
    document_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
