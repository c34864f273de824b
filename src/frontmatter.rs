//! Front-matter parsing.
//!
//! A document starts with a metadata block fenced by two `---` lines:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: 2024-03-01
//! status: draft
//! ---
//! Body text
//! ```
//!
//! Only a fixed set of keys is recognized (see [`Key`]). Values that cannot
//! be interpreted fall back according to [`Fallback`] instead of failing the
//! parse; every fallback taken is returned in [`Parsed::fallbacks`].

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::borrow::Cow;
use std::path::Path;

use crate::models::{Document, LocalFile};
use crate::render::Renderer;

pub const DELIMITER: &str = "---";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Front-matter keys the parser understands. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Title,
    Date,
    Category,
    Tags,
    Status,
    Template,
    Parent,
    Order,
}

impl Key {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Key::Title),
            "date" => Some(Key::Date),
            "category" => Some(Key::Category),
            "tags" => Some(Key::Tags),
            "status" => Some(Key::Status),
            "template" => Some(Key::Template),
            "parent" => Some(Key::Parent),
            "order" => Some(Key::Order),
            _ => None,
        }
    }
}

/// What the parser did with a value it could not interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The field kept the value it had before this line (dates).
    KeptPrevious,
    /// The field was set to zero (numeric fields).
    Zeroed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFallback {
    pub key: Key,
    pub value: String,
    pub fallback: Fallback,
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: Document,
    pub fallbacks: Vec<FieldFallback>,
}

/// Parse `raw` into a [`Document`] named `filename`.
///
/// `now` is used as the document date when no valid `date:` is declared and
/// as the placeholder modification time. A missing or unterminated metadata
/// block is not an error: the whole input becomes the body and every field
/// keeps its default.
pub fn parse(filename: &str, raw: &str, now: DateTime<Utc>) -> Parsed {
    let mut document = Document::with_defaults(filename, now);
    let mut fallbacks = Vec::new();

    let lines: Vec<&str> = raw.split('\n').collect();

    let Some(open) = lines.iter().position(|l| l.trim() == DELIMITER) else {
        document.content = raw.to_string();
        return Parsed {
            document,
            fallbacks,
        };
    };
    let Some(close) = lines[open + 1..]
        .iter()
        .position(|l| l.trim() == DELIMITER)
        .map(|i| open + 1 + i)
    else {
        document.content = raw.to_string();
        return Parsed {
            document,
            fallbacks,
        };
    };

    for line in &lines[open + 1..close] {
        let line = line.trim();
        let Some(colon) = line.find(':') else {
            continue;
        };
        if colon == 0 {
            continue;
        }
        let name = line[..colon].trim();
        let Some(key) = Key::from_name(name) else {
            continue;
        };
        let value = unquote(line[colon + 1..].trim());
        if let Some(fb) = apply(&mut document, key, value) {
            fallbacks.push(FieldFallback {
                key,
                value: value.to_string(),
                fallback: fb,
            });
        }
    }

    document.content = lines[close + 1..].join("\n");
    Parsed {
        document,
        fallbacks,
    }
}

/// Strip one layer of surrounding double quotes.
fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

fn apply(document: &mut Document, key: Key, value: &str) -> Option<Fallback> {
    match key {
        Key::Title => document.title = value.to_string(),
        Key::Category => document.category = value.to_string(),
        Key::Tags => document.tags = value.to_string(),
        Key::Status => document.status = value.to_string(),
        Key::Template => document.template = Some(value.to_string()),
        Key::Date => match parse_date(value) {
            Some(date) => document.date = date,
            None => return Some(Fallback::KeptPrevious),
        },
        Key::Parent => match value.parse::<u64>() {
            Ok(parent) => document.parent = parent,
            Err(_) => {
                document.parent = 0;
                return Some(Fallback::Zeroed);
            }
        },
        Key::Order => match value.parse::<i64>() {
            Ok(order) => document.order = Some(order),
            Err(_) => {
                document.order = Some(0);
                return Some(Fallback::Zeroed);
            }
        },
    }
    None
}

/// A `YYYY-MM-DD` date at midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Read `local` from `dir`, parse it, and render its body.
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD and logged.
pub fn load(dir: &Path, local: &LocalFile, renderer: &dyn Renderer) -> Result<Document> {
    let path = dir.join(&local.filename);
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            tracing::warn!(file = %local.filename, "not valid UTF-8, invalid bytes replaced");
            text
        }
    };

    let Parsed {
        mut document,
        fallbacks,
    } = parse(&local.filename, &raw, Utc::now());

    for fb in &fallbacks {
        tracing::debug!(
            file = %local.filename,
            key = ?fb.key,
            value = %fb.value,
            fallback = ?fb.fallback,
            "unparseable front matter value"
        );
    }

    document.content = renderer.render(&document.content);
    document.modified = local.modified;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    #[test]
    fn test_title_status_and_body() {
        let raw = "---\ntitle: \"Hello\"\nstatus: draft\n---\nBody text";
        let parsed = parse("hello.md", raw, now());
        let doc = parsed.document;
        assert_eq!(doc.title, "Hello");
        assert_eq!(doc.status, "draft");
        assert_eq!(doc.content, "Body text");
        assert!(parsed.fallbacks.is_empty());
    }

    #[test]
    fn test_defaults_without_block() {
        let raw = "# Just markdown\n\ntitle: not metadata\n";
        let doc = parse("plain.md", raw, now()).document;
        assert_eq!(doc.title, "");
        assert_eq!(doc.status, "publish");
        assert_eq!(doc.date, now());
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_unterminated_block_is_all_body() {
        let raw = "---\ntitle: Lost\nBody";
        let doc = parse("open.md", raw, now()).document;
        assert_eq!(doc.title, "");
        assert_eq!(doc.content, raw);
    }

    #[test]
    fn test_all_keys() {
        let raw = "---\n\
                   title: Post\n\
                   date: 2023-12-25\n\
                   category: News\n\
                   tags: a, b\n\
                   status: private\n\
                   template: wide.php\n\
                   parent: 42\n\
                   order: 3\n\
                   ---\n\
                   line one\nline two\n";
        let doc = parse("all.md", raw, now()).document;
        assert_eq!(doc.title, "Post");
        assert_eq!(
            doc.date,
            Utc.with_ymd_and_hms(2023, 12, 25, 0, 0, 0).unwrap()
        );
        assert_eq!(doc.category, "News");
        assert_eq!(doc.tags, "a, b");
        assert_eq!(doc.status, "private");
        assert_eq!(doc.template.as_deref(), Some("wide.php"));
        assert_eq!(doc.parent, 42);
        assert_eq!(doc.order, Some(3));
        assert_eq!(doc.content, "line one\nline two\n");
    }

    #[test]
    fn test_keys_are_case_sensitive_and_unknown_ignored() {
        let raw = "---\nTitle: Upper\nauthor: me\ntitle: lower\n---\n";
        let doc = parse("case.md", raw, now()).document;
        assert_eq!(doc.title, "lower");
    }

    #[test]
    fn test_key_lines_outside_block_ignored() {
        let raw = "---\ntitle: In\n---\nstatus: draft\n";
        let doc = parse("outside.md", raw, now()).document;
        assert_eq!(doc.status, "publish");
        assert_eq!(doc.content, "status: draft\n");
    }

    #[test]
    fn test_only_one_layer_of_quotes_removed() {
        let raw = "---\ntitle: \"\"Quoted\"\"\n---\n";
        let doc = parse("q.md", raw, now()).document;
        assert_eq!(doc.title, "\"Quoted\"");
    }

    #[test]
    fn test_value_may_contain_colons() {
        let raw = "---\ntitle: Rust: the good parts\n---\n";
        let doc = parse("c.md", raw, now()).document;
        assert_eq!(doc.title, "Rust: the good parts");
    }

    #[test]
    fn test_indented_delimiters() {
        let raw = "  ---  \ntitle: Spaced\n\t---\nbody";
        let doc = parse("s.md", raw, now()).document;
        assert_eq!(doc.title, "Spaced");
        assert_eq!(doc.content, "body");
    }

    #[test]
    fn test_bad_date_keeps_previous_value() {
        let raw = "---\ndate: 2023-01-02\ndate: next tuesday\n---\n";
        let parsed = parse("d.md", raw, now());
        assert_eq!(
            parsed.document.date,
            Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parsed.fallbacks,
            vec![FieldFallback {
                key: Key::Date,
                value: "next tuesday".to_string(),
                fallback: Fallback::KeptPrevious,
            }]
        );
    }

    #[test]
    fn test_bad_date_alone_keeps_parse_time() {
        let raw = "---\ndate: 01/02/2023\n---\n";
        let parsed = parse("d.md", raw, now());
        assert_eq!(parsed.document.date, now());
        assert_eq!(parsed.fallbacks[0].fallback, Fallback::KeptPrevious);
    }

    #[test]
    fn test_bad_numbers_are_zeroed() {
        let raw = "---\nparent: home\norder: first\n---\n";
        let parsed = parse("n.md", raw, now());
        assert_eq!(parsed.document.parent, 0);
        assert_eq!(parsed.document.order, Some(0));
        let kinds: Vec<_> = parsed.fallbacks.iter().map(|f| (f.key, f.fallback)).collect();
        assert_eq!(
            kinds,
            vec![
                (Key::Parent, Fallback::Zeroed),
                (Key::Order, Fallback::Zeroed)
            ]
        );
    }

    #[test]
    fn test_load_renders_and_sets_mtime() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("a.md"),
            "---\ntitle: A\n---\n*hi*\n",
        )
        .unwrap();
        let local = LocalFile {
            filename: "a.md".to_string(),
            modified: now(),
        };
        let doc = load(tmp.path(), &local, &crate::render::Markdown).unwrap();
        assert_eq!(doc.title, "A");
        assert_eq!(doc.content, "<p><em>hi</em></p>\n");
        assert_eq!(doc.modified, now());
    }

    #[test]
    fn test_load_replaces_invalid_utf8() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut raw = b"---\ntitle: Caf".to_vec();
        raw.push(0xE9);
        raw.extend_from_slice(b"\n---\nna\xEFve body");
        std::fs::write(tmp.path().join("latin1.md"), &raw).unwrap();
        let local = LocalFile {
            filename: "latin1.md".to_string(),
            modified: now(),
        };
        let doc = load(tmp.path(), &local, &crate::render::Passthrough).unwrap();
        assert_eq!(doc.title, "Caf\u{FFFD}");
        assert_eq!(doc.content, "na\u{FFFD}ve body");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let local = LocalFile {
            filename: "gone.md".to_string(),
            modified: now(),
        };
        assert!(load(tmp.path(), &local, &crate::render::Passthrough).is_err());
    }
}
