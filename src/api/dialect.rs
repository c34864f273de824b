use anyhow::{Context, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{RemoteDocument, RemoteMedia};
use crate::models::{Collection, Document};

pub const WPCOM_API_ROOT: &str = "https://public-api.wordpress.com/rest/v1.1/sites";

/// Request and response field mapping for one version of the WordPress API.
///
/// - `wp-v2`: the core REST API under `<site>/wp-json`, authenticated with a
///   token from the JWT Auth plugin.
/// - `wpcom`: the WordPress.com / Jetpack REST API v1.1, authenticated with
///   an OAuth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "wp-v2")]
    WpV2,
    #[serde(rename = "wpcom")]
    WpCom,
}

impl Dialect {
    /// Endpoint root derived from the site URL.
    pub fn base_url(&self, site_url: &str) -> Result<String> {
        let site = site_url.trim_end_matches('/');
        match self {
            Dialect::WpV2 => Ok(format!("{}/wp-json", site)),
            Dialect::WpCom => {
                let parsed = url::Url::parse(site)
                    .with_context(|| format!("Invalid site URL: {}", site))?;
                let host = parsed
                    .host_str()
                    .ok_or_else(|| anyhow::anyhow!("Site URL has no host: {}", site))?;
                Ok(format!("{}/{}", WPCOM_API_ROOT, host))
            }
        }
    }

    pub fn create_path(&self, collection: Collection) -> String {
        match self {
            Dialect::WpV2 => format!("wp/v2/{}", collection.dir_name()),
            Dialect::WpCom => "posts/new".to_string(),
        }
    }

    pub fn update_path(&self, collection: Collection, id: u64) -> String {
        match self {
            Dialect::WpV2 => format!("wp/v2/{}/{}", collection.dir_name(), id),
            Dialect::WpCom => format!("posts/{}", id),
        }
    }

    pub fn media_path(&self) -> &'static str {
        match self {
            Dialect::WpV2 => "wp/v2/media",
            Dialect::WpCom => "media/new",
        }
    }

    /// Multipart field name carrying the uploaded file.
    pub fn media_field(&self) -> &'static str {
        match self {
            Dialect::WpV2 => "file",
            Dialect::WpCom => "media[]",
        }
    }

    /// Request used to check that the token is accepted.
    pub fn validate_request(&self) -> (Method, &'static str) {
        match self {
            Dialect::WpV2 => (Method::POST, "jwt-auth/v1/token/validate"),
            // Listing drafts requires an authenticated author.
            Dialect::WpCom => (Method::GET, "posts/?status=draft&number=1"),
        }
    }

    /// JSON body for a create or update. Both send the same full document.
    ///
    /// Posts carry `publicize: 0` so a sync never triggers social sharing.
    ///
    /// wp-v2 takes categories and tags as term ids, which a file cannot know,
    /// so they are only sent by name in the wpcom dialect.
    pub fn document_payload(&self, collection: Collection, doc: &Document) -> Value {
        let mut body = Map::new();
        body.insert("title".into(), json!(doc.title));
        body.insert("content".into(), json!(doc.content));
        body.insert("status".into(), json!(doc.status));

        let date = doc.date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        match (self, collection) {
            (Dialect::WpV2, Collection::Pages) => {
                body.insert("template".into(), json!(doc.template.clone().unwrap_or_default()));
                body.insert("parent".into(), json!(doc.parent));
                body.insert("menu_order".into(), json!(doc.order.unwrap_or(0)));
            }
            (Dialect::WpV2, _) => {
                body.insert("date".into(), json!(date));
                body.insert("publicize".into(), json!(0));
            }
            (Dialect::WpCom, Collection::Pages) => {
                body.insert("type".into(), json!("page"));
                body.insert(
                    "page_template".into(),
                    json!(doc.template.clone().unwrap_or_default()),
                );
                body.insert("parent".into(), json!(doc.parent));
                body.insert("menu_order".into(), json!(doc.order.unwrap_or(0)));
            }
            (Dialect::WpCom, _) => {
                body.insert("type".into(), json!("post"));
                body.insert("date".into(), json!(date));
                body.insert("categories".into(), json!(doc.category));
                body.insert("tags".into(), json!(doc.tags));
                body.insert("publicize".into(), json!(0));
            }
        }

        Value::Object(body)
    }

    pub fn decode_document(&self, bytes: &[u8]) -> Result<RemoteDocument, serde_json::Error> {
        match self {
            Dialect::WpV2 => {
                let r: WpV2Document = serde_json::from_slice(bytes)?;
                Ok(RemoteDocument {
                    id: r.id,
                    url: r.link,
                    status: r.status,
                    date: r.date,
                })
            }
            Dialect::WpCom => {
                let r: WpComDocument = serde_json::from_slice(bytes)?;
                Ok(RemoteDocument {
                    id: r.id,
                    url: r.url,
                    status: r.status,
                    date: r.date,
                })
            }
        }
    }

    pub fn decode_media(&self, bytes: &[u8]) -> Result<RemoteMedia, serde_json::Error> {
        match self {
            Dialect::WpV2 => {
                let r: WpV2Media = serde_json::from_slice(bytes)?;
                Ok(RemoteMedia {
                    id: r.id,
                    url: r.source_url,
                    link: r.link,
                })
            }
            Dialect::WpCom => {
                let r: WpComMediaList = serde_json::from_slice(bytes)?;
                let first = r.media.into_iter().next().ok_or_else(|| {
                    <serde_json::Error as serde::de::Error>::custom("media list is empty")
                })?;
                Ok(RemoteMedia {
                    id: first.id,
                    url: first.url,
                    link: first.link,
                })
            }
        }
    }
}

#[derive(Deserialize)]
struct WpV2Document {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    link: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct WpComDocument {
    #[serde(default, rename = "ID")]
    id: u64,
    #[serde(default, rename = "URL")]
    url: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct WpV2Media {
    id: u64,
    #[serde(default)]
    source_url: String,
    #[serde(default)]
    link: String,
}

#[derive(Deserialize)]
struct WpComMediaList {
    media: Vec<WpComMedia>,
}

#[derive(Deserialize)]
struct WpComMedia {
    #[serde(rename = "ID")]
    id: u64,
    #[serde(default, rename = "URL")]
    url: String,
    #[serde(default)]
    link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc() -> Document {
        let mut d = Document::with_defaults("a.md", Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap());
        d.title = "Hello".to_string();
        d.content = "<p>Hi</p>".to_string();
        d.status = "draft".to_string();
        d.category = "News".to_string();
        d.tags = "x, y".to_string();
        d
    }

    #[test]
    fn test_dialect_names() {
        #[derive(Deserialize)]
        struct Wrap {
            d: Dialect,
        }
        let w: Wrap = toml::from_str("d = \"wp-v2\"").unwrap();
        assert_eq!(w.d, Dialect::WpV2);
        let w: Wrap = toml::from_str("d = \"wpcom\"").unwrap();
        assert_eq!(w.d, Dialect::WpCom);
    }

    #[test]
    fn test_base_urls() {
        assert_eq!(
            Dialect::WpV2.base_url("https://blog.test/").unwrap(),
            "https://blog.test/wp-json"
        );
        assert_eq!(
            Dialect::WpCom.base_url("https://blog.test").unwrap(),
            "https://public-api.wordpress.com/rest/v1.1/sites/blog.test"
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(Dialect::WpV2.create_path(Collection::Pages), "wp/v2/pages");
        assert_eq!(Dialect::WpV2.update_path(Collection::Posts, 9), "wp/v2/posts/9");
        assert_eq!(Dialect::WpCom.create_path(Collection::Pages), "posts/new");
        assert_eq!(Dialect::WpCom.update_path(Collection::Pages, 9), "posts/9");
    }

    #[test]
    fn test_wp_v2_post_payload() {
        let body = Dialect::WpV2.document_payload(Collection::Posts, &doc());
        assert_eq!(body["title"], "Hello");
        assert_eq!(body["status"], "draft");
        assert_eq!(body["date"], "2024-02-03T00:00:00Z");
        assert_eq!(body["publicize"], 0);
        assert!(body.get("categories").is_none());
        assert!(body.get("parent").is_none());
    }

    #[test]
    fn test_wp_v2_page_payload_sends_defaults() {
        let body = Dialect::WpV2.document_payload(Collection::Pages, &doc());
        assert_eq!(body["template"], "");
        assert_eq!(body["parent"], 0);
        assert_eq!(body["menu_order"], 0);
        assert!(body.get("date").is_none());
    }

    #[test]
    fn test_wpcom_post_payload_has_taxonomy() {
        let body = Dialect::WpCom.document_payload(Collection::Posts, &doc());
        assert_eq!(body["type"], "post");
        assert_eq!(body["categories"], "News");
        assert_eq!(body["tags"], "x, y");
        assert_eq!(body["publicize"], 0);

        let page = Dialect::WpCom.document_payload(Collection::Pages, &doc());
        assert!(page.get("publicize").is_none());
    }

    #[test]
    fn test_decode_documents() {
        let v2 = Dialect::WpV2
            .decode_document(br#"{"id":5,"link":"https://b.test/?p=5","status":"draft","date":"2024-01-01T00:00:00","title":{"rendered":"x"}}"#)
            .unwrap();
        assert_eq!(v2.id, 5);
        assert_eq!(v2.url, "https://b.test/?p=5");
        assert_eq!(v2.status.as_deref(), Some("draft"));

        let com = Dialect::WpCom
            .decode_document(br#"{"ID":6,"URL":"https://b.test/six","status":"publish"}"#)
            .unwrap();
        assert_eq!(com.id, 6);
        assert_eq!(com.url, "https://b.test/six");
        assert!(com.date.is_none());
    }

    #[test]
    fn test_decode_media() {
        let v2 = Dialect::WpV2
            .decode_media(br#"{"id":3,"source_url":"https://b.test/a.jpg","link":"https://b.test/a"}"#)
            .unwrap();
        assert_eq!(v2.url, "https://b.test/a.jpg");

        let com = Dialect::WpCom
            .decode_media(br#"{"media":[{"ID":4,"URL":"https://b.test/b.jpg","link":"https://b.test/b"}]}"#)
            .unwrap();
        assert_eq!(com.id, 4);

        assert!(Dialect::WpCom.decode_media(br#"{"media":[]}"#).is_err());
        assert!(Dialect::WpV2.decode_media(b"not json").is_err());
    }
}
