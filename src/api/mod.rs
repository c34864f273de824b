//! Remote content API.
//!
//! The reconciliation core talks to the site only through [`RemoteApi`].
//! [`HttpApi`] implements it over HTTP with bearer-token auth; the request
//! and response field names come from the configured [`Dialect`].
//!
//! # Error Contract
//!
//! | Variant | Cause |
//! |---------|-------|
//! | [`ApiError::Status`] | HTTP status ≥ 300; carries the raw response body |
//! | [`ApiError::Transport`] | connection, TLS, or timeout failure |
//! | [`ApiError::Decode`] | 2xx response whose body is not the expected JSON |
//! | [`ApiError::File`] | local media file could not be read for upload |
//!
//! None of these are retried.

mod dialect;
mod http;

pub use dialect::Dialect;
pub use http::HttpApi;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::models::{Collection, Document};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("API error [{status}]: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], otherwise `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What the site reports back after a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteDocument {
    pub id: u64,
    pub url: String,
    pub status: Option<String>,
    /// Server-assigned publish date, in the server's own format.
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteMedia {
    pub id: u64,
    /// Direct link to the file.
    pub url: String,
    /// Attachment page.
    pub link: String,
}

/// Operations the sync driver needs from the remote site.
///
/// Every call sends the complete document; there are no partial updates.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create(&self, collection: Collection, doc: &Document)
        -> Result<RemoteDocument, ApiError>;

    async fn update(
        &self,
        collection: Collection,
        id: u64,
        doc: &Document,
    ) -> Result<RemoteDocument, ApiError>;

    async fn upload_media(&self, path: &Path, filename: &str) -> Result<RemoteMedia, ApiError>;

    /// Succeeds when the configured token is accepted by the site.
    async fn validate_token(&self) -> Result<(), ApiError>;
}
