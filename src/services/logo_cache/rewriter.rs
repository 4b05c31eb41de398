//! Writes resolved logo URLs back into a schedule document

use std::collections::HashMap;

use super::dedup::{ShowGroup, ShowGroups};
use super::namer::LogoNamer;
use super::task::FetchResult;
use crate::models::ScheduleDocument;

/// Counts from applying one document's logo resolutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Entries whose `show_logo` was written
    pub entries_rewritten: usize,
    /// Shows pointed at their cached asset
    pub shows_local: usize,
    /// Shows pointed at the fallback logo
    pub shows_fallback: usize,
}

/// Resolves each show's final logo URL for one document
#[derive(Debug, Clone, Copy)]
pub struct LogoRewriter<'a> {
    namer: &'a LogoNamer,
    fallback_url: &'a str,
    channel_folder: &'a str,
    day: &'a str,
}

impl<'a> LogoRewriter<'a> {
    pub fn new(
        namer: &'a LogoNamer,
        fallback_url: &'a str,
        channel_folder: &'a str,
        day: &'a str,
    ) -> Self {
        Self {
            namer,
            fallback_url,
            channel_folder,
            day,
        }
    }

    /// The public asset URL when the show's asset exists, the fallback
    /// otherwise. A missing result counts as a failure.
    pub fn resolve(&self, group: &ShowGroup, result: Option<&FetchResult>) -> String {
        if Self::asset_available(group, result) {
            self.namer
                .public_url(self.channel_folder, self.day, &group.show_name)
        } else {
            self.fallback_url.to_string()
        }
    }

    fn asset_available(group: &ShowGroup, result: Option<&FetchResult>) -> bool {
        group.source_url.is_some() && result.is_some_and(|r| r.outcome.is_available())
    }

    /// Write the resolved URL into every entry of every group
    ///
    /// Entries with blank names belong to no group and are never touched.
    pub fn apply(
        &self,
        document: &mut ScheduleDocument,
        groups: &ShowGroups,
        results: &HashMap<String, FetchResult>,
    ) -> RewriteStats {
        let mut stats = RewriteStats::default();

        for group in groups.iter() {
            let result = results.get(&group.show_name);
            if Self::asset_available(group, result) {
                stats.shows_local += 1;
            } else {
                stats.shows_fallback += 1;
            }
            let url = self.resolve(group, result);

            for &index in &group.indices {
                if let Some(entry) = document.programs.get_mut(index) {
                    entry.set_show_logo(url.clone());
                    stats.entries_rewritten += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::models::{LogoAssetFormat, ProgramEntry};
    use crate::services::logo_cache::task::{FetchOutcome, FetchTask};
    use std::path::PathBuf;

    const FALLBACK: &str = "https://cdn.example.com/sample-image.webp";

    fn namer() -> LogoNamer {
        LogoNamer::new(
            "/srv/downloaded-images",
            "https://cdn.example.com/uploads",
            LogoAssetFormat::Webp,
        )
        .unwrap()
    }

    fn result(show: &str, outcome: FetchOutcome) -> (String, FetchResult) {
        let task = FetchTask {
            show_name: show.to_string(),
            source_url: format!("http://src/{show}.jpg"),
            destination: PathBuf::from(format!("/srv/downloaded-images/Rai-1/today/{show}.webp")),
        };
        (show.to_string(), FetchResult::new(task, outcome))
    }

    #[test]
    fn test_every_occurrence_gets_the_same_url() {
        let mut document = ScheduleDocument {
            programs: vec![
                ProgramEntry::new("News", ""),
                ProgramEntry::new("Film", "http://src/film.jpg"),
                ProgramEntry::new("News", "http://src/news.jpg"),
                ProgramEntry::new("", "http://src/untitled.jpg"),
            ],
            ..Default::default()
        };
        let groups = ShowGroups::from_entries(&document.programs);
        let results: HashMap<_, _> = [
            result("News", FetchOutcome::Fetched { bytes_downloaded: 10 }),
            result(
                "Film",
                FetchOutcome::Failed {
                    kind: FailureKind::Network,
                    message: "503".into(),
                },
            ),
        ]
        .into_iter()
        .collect();

        let namer = namer();
        let stats = LogoRewriter::new(&namer, FALLBACK, "Rai-1", "today").apply(
            &mut document,
            &groups,
            &results,
        );

        let news = "https://cdn.example.com/uploads/downloaded-images/Rai-1/today/news.webp";
        assert_eq!(document.programs[0].show_logo(), news);
        assert_eq!(document.programs[2].show_logo(), news);
        assert_eq!(document.programs[1].show_logo(), FALLBACK);
        assert_eq!(document.programs[3].show_logo(), "http://src/untitled.jpg");
        assert_eq!(
            stats,
            RewriteStats {
                entries_rewritten: 3,
                shows_local: 1,
                shows_fallback: 1,
            }
        );
    }

    #[test]
    fn test_show_without_source_uses_fallback() {
        let namer = namer();
        let rewriter = LogoRewriter::new(&namer, FALLBACK, "Rai-1", "today");
        let group = ShowGroup {
            show_name: "Meteo".into(),
            source_url: None,
            indices: vec![0],
        };

        // Even a stray cached result cannot promote a show with no source
        let (_, cached) = result("Meteo", FetchOutcome::Cached);
        assert_eq!(rewriter.resolve(&group, Some(&cached)), FALLBACK);
        assert_eq!(rewriter.resolve(&group, None), FALLBACK);
    }

    #[test]
    fn test_missing_result_counts_as_failure() {
        let namer = namer();
        let rewriter = LogoRewriter::new(&namer, FALLBACK, "Rai-1", "today");
        let group = ShowGroup {
            show_name: "Film".into(),
            source_url: Some("http://src/film.jpg".into()),
            indices: vec![0],
        };
        assert_eq!(rewriter.resolve(&group, None), FALLBACK);
    }

    #[test]
    fn test_cached_asset_resolves_locally() {
        let namer = namer();
        let rewriter = LogoRewriter::new(&namer, FALLBACK, "Rai-1", "tomorrow");
        let group = ShowGroup {
            show_name: "South Park".into(),
            source_url: Some("http://src/sp.jpg".into()),
            indices: vec![0],
        };
        let (_, cached) = result("South Park", FetchOutcome::Cached);
        assert_eq!(
            rewriter.resolve(&group, Some(&cached)),
            "https://cdn.example.com/uploads/downloaded-images/Rai-1/tomorrow/south-park.webp"
        );
    }
}
