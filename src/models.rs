//! Core data models used throughout wpsync.
//!
//! A [`LocalFile`] is what the scanner sees on disk, a [`Document`] is the
//! parsed and rendered content of one file, and a [`Record`] is the sync
//! bookkeeping persisted in the manifest between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three local collections. Collections are never cross-joined:
/// `about.md` in `pages/` and `about.md` in `posts/` are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Posts,
    Pages,
    Media,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Posts, Collection::Pages, Collection::Media];

    /// Directory name under the sync root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Pages => "pages",
            Collection::Media => "media",
        }
    }

    /// Manifest file name under the sync root.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Collection::Posts => "posts.json",
            Collection::Pages => "pages.json",
            Collection::Media => "media.json",
        }
    }

    /// Singular noun for prompts and log lines.
    pub fn noun(&self) -> &'static str {
        match self {
            Collection::Posts => "post",
            Collection::Pages => "page",
            Collection::Media => "media",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for Collection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Collection::Posts),
            "pages" => Ok(Collection::Pages),
            "media" => Ok(Collection::Media),
            other => anyhow::bail!(
                "Unknown collection: '{}'. Must be posts, pages, or media.",
                other
            ),
        }
    }
}

/// A file found in a collection directory, before its content is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name relative to the collection directory; the join key.
    pub filename: String,
    pub modified: DateTime<Utc>,
}

/// A post or page parsed from its markdown source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub filename: String,
    pub title: String,
    /// Body text. Raw markdown after parsing, HTML after rendering.
    pub content: String,
    pub category: String,
    pub tags: String,
    pub status: String,
    pub template: Option<String>,
    pub parent: u64,
    pub order: Option<i64>,
    /// Declared `date:` at midnight UTC, otherwise the parse time.
    pub date: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

pub const DEFAULT_STATUS: &str = "publish";

impl Document {
    /// A document carrying only defaults, as if its file had no front matter
    /// and an empty body.
    pub fn with_defaults(filename: &str, now: DateTime<Utc>) -> Self {
        Self {
            filename: filename.to_string(),
            title: String::new(),
            content: String::new(),
            category: String::new(),
            tags: String::new(),
            status: DEFAULT_STATUS.to_string(),
            template: None,
            parent: 0,
            order: None,
            date: now,
            modified: now,
        }
    }
}

/// Persisted sync state for one post or page.
///
/// Older manifests used Go-style keys (`LocalFile`, `link`, `SyncDate`); the
/// aliases keep those files readable. They are rewritten with the new keys
/// on the next successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "LocalFile")]
    pub filename: String,
    pub id: u64,
    #[serde(default, alias = "link")]
    pub url: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(alias = "SyncDate")]
    pub synced_at: DateTime<Utc>,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Persisted sync state for one uploaded media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    #[serde(alias = "LocalFile")]
    pub filename: String,
    pub id: u64,
    /// Direct link to the uploaded file.
    #[serde(default, alias = "source_url")]
    pub url: String,
    /// Attachment page.
    #[serde(default)]
    pub link: String,
}

/// A local file that has a record but was modified after its last sync.
#[derive(Debug, Clone, PartialEq)]
pub struct StaleFile {
    pub local: LocalFile,
    pub record: Record,
}

/// Partition of one collection's local files against its manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub new: Vec<LocalFile>,
    pub stale: Vec<StaleFile>,
    pub unchanged: Vec<LocalFile>,
}

impl Classification {
    /// True when neither creates nor updates are pending.
    pub fn is_settled(&self) -> bool {
        self.new.is_empty() && self.stale.is_empty()
    }
}
