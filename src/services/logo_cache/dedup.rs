//! Grouping of program entries by show within one schedule document

use std::collections::HashMap;

use crate::models::ProgramEntry;
use crate::utils::url::UrlUtils;

/// Every occurrence of one exact show name within a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowGroup {
    pub show_name: String,
    /// First `http`-prefixed logo seen for the show, if any
    pub source_url: Option<String>,
    /// Positions of the show's entries, in document order
    pub indices: Vec<usize>,
}

/// Show groups of one document in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowGroups {
    groups: Vec<ShowGroup>,
    by_name: HashMap<String, usize>,
}

impl ShowGroups {
    /// Group entries by exact (case-sensitive, unnormalized) show name
    ///
    /// Entries with a blank name are skipped entirely. Every other entry's
    /// index is recorded, whether or not it carries a usable logo, so the
    /// resolved URL can be written to all of them.
    pub fn from_entries(entries: &[ProgramEntry]) -> Self {
        let mut groups = ShowGroups::default();

        for (index, entry) in entries.iter().enumerate() {
            if entry.has_blank_name() {
                continue;
            }

            let group = groups.entry(entry.show_name());
            let logo = entry.show_logo().trim();
            if group.source_url.is_none() && UrlUtils::is_remote_logo(logo) {
                group.source_url = Some(logo.to_string());
            }
            group.indices.push(index);
        }

        groups
    }

    fn entry(&mut self, show_name: &str) -> &mut ShowGroup {
        let position = match self.by_name.get(show_name) {
            Some(&position) => position,
            None => {
                self.groups.push(ShowGroup {
                    show_name: show_name.to_string(),
                    source_url: None,
                    indices: Vec::new(),
                });
                let position = self.groups.len() - 1;
                self.by_name.insert(show_name.to_string(), position);
                position
            }
        };
        &mut self.groups[position]
    }

    pub fn get(&self, show_name: &str) -> Option<&ShowGroup> {
        self.by_name.get(show_name).map(|&i| &self.groups[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShowGroup> {
        self.groups.iter()
    }

    /// Groups that have a source URL to fetch
    pub fn fetchable(&self) -> impl Iterator<Item = &ShowGroup> {
        self.groups.iter().filter(|g| g.source_url.is_some())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
