//! Schedule documents produced by the upstream EPG extractor
//!
//! One document exists per channel per day bucket. Only `show_name` and
//! `show_logo` are interpreted; everything else is carried through verbatim,
//! in its original key order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One channel's program listing for one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default)]
    pub programs: Vec<ProgramEntry>,
    /// Top-level keys this crate does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const SHOW_NAME: &str = "show_name";
const SHOW_LOGO: &str = "show_logo";

/// A single program in a schedule document
///
/// The entry keeps its JSON object as-is. `show_name` and `show_logo` are read
/// as strings (a missing, null or non-string value reads as empty) and only
/// `show_logo` is ever written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramEntry {
    pub fields: Map<String, Value>,
}

impl ProgramEntry {
    pub fn new<N: Into<String>, L: Into<String>>(show_name: N, show_logo: L) -> Self {
        let mut fields = Map::new();
        fields.insert(SHOW_NAME.to_string(), Value::String(show_name.into()));
        fields.insert(SHOW_LOGO.to_string(), Value::String(show_logo.into()));
        Self { fields }
    }

    fn text(&self, key: &str) -> &str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn show_name(&self) -> &str {
        self.text(SHOW_NAME)
    }

    pub fn show_logo(&self) -> &str {
        self.text(SHOW_LOGO)
    }

    /// Replace `show_logo`, keeping the key where it already is
    pub fn set_show_logo<L: Into<String>>(&mut self, url: L) {
        self.fields
            .insert(SHOW_LOGO.to_string(), Value::String(url.into()));
    }

    /// Entries with an empty or whitespace-only name are never grouped or rewritten
    pub fn has_blank_name(&self) -> bool {
        self.show_name().trim().is_empty()
    }
}

impl ScheduleDocument {
    /// Parse a document from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Serialize the document the way it is stored on disk
    pub fn to_pretty_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
