use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::Dialect;
use crate::models::Collection;

/// Environment variable that overrides `site.token`.
pub const TOKEN_ENV: &str = "WPSYNC_TOKEN";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub collections: CollectionsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    pub url: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub dialect: Dialect,
    /// Overrides the endpoint root the dialect would derive from `site.url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            base_url: None,
            timeout_secs: 30,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Directory holding `posts/`, `pages/`, `media/` and the manifests.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub markdown: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { markdown: true }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CollectionsConfig {
    #[serde(default = "default_doc_extension")]
    pub post_extension: String,
    #[serde(default = "default_doc_extension")]
    pub page_extension: String,
    #[serde(default = "default_media_extension")]
    pub media_extension: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            post_extension: default_doc_extension(),
            page_extension: default_doc_extension(),
            media_extension: default_media_extension(),
        }
    }
}

fn default_doc_extension() -> String {
    ".md".to_string()
}
fn default_media_extension() -> String {
    ".jpg".to_string()
}

impl Config {
    /// A config for `site_url` with every other setting at its default.
    pub fn for_site(site_url: &str) -> Self {
        Self {
            site: SiteConfig {
                url: site_url.trim_end_matches('/').to_string(),
                token: String::new(),
            },
            api: ApiConfig::default(),
            paths: PathsConfig::default(),
            render: RenderConfig::default(),
            collections: CollectionsConfig::default(),
        }
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.paths.root.join(collection.dir_name())
    }

    pub fn manifest_path(&self, collection: Collection) -> PathBuf {
        self.paths.root.join(collection.manifest_name())
    }

    pub fn extension(&self, collection: Collection) -> &str {
        match collection {
            Collection::Posts => &self.collections.post_extension,
            Collection::Pages => &self.collections.page_extension,
            Collection::Media => &self.collections.media_extension,
        }
    }

    /// Root URL that API endpoint paths are joined onto.
    pub fn api_base(&self) -> Result<String> {
        match &self.api.base_url {
            Some(base) => Ok(base.trim_end_matches('/').to_string()),
            None => self.api.dialect.base_url(&self.site.url),
        }
    }

    pub fn has_token(&self) -> bool {
        !self.site.token.trim().is_empty()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.site.token = token;
        }
    }

    validate(&mut config)?;
    Ok(config)
}

fn validate(config: &mut Config) -> Result<()> {
    config.site.url = config.site.url.trim_end_matches('/').to_string();

    // Validate site
    let parsed = url::Url::parse(&config.site.url)
        .with_context(|| format!("site.url is not a valid URL: '{}'", config.site.url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("site.url must start with http:// or https://");
    }

    // Validate api
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }

    // Validate collections
    for (name, ext) in [
        ("post_extension", &config.collections.post_extension),
        ("page_extension", &config.collections.page_extension),
        ("media_extension", &config.collections.media_extension),
    ] {
        if ext.is_empty() {
            anyhow::bail!("collections.{} must not be empty", name);
        }
    }

    Ok(())
}

/// Write `config` to `path` as TOML, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to encode config")?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
