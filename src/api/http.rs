use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use std::path::Path;
use std::time::Duration;

use super::{ApiError, Dialect, RemoteApi, RemoteDocument, RemoteMedia};
use crate::config::Config;
use crate::models::{Collection, Document};

/// [`RemoteApi`] over HTTP with a bearer token.
pub struct HttpApi {
    client: reqwest::Client,
    base: String,
    token: String,
    dialect: Dialect,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(concat!("wpsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: config.api_base()?,
            token: config.site.token.clone(),
            dialect: config.api.dialect,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
    }

    /// Send and return the body of a successful response.
    ///
    /// Anything at or above 300 is an error carrying the raw body, since the
    /// API does not guarantee a structured error document.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 300 {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn create(
        &self,
        collection: Collection,
        doc: &Document,
    ) -> Result<RemoteDocument, ApiError> {
        let path = self.dialect.create_path(collection);
        let body = self.dialect.document_payload(collection, doc);
        tracing::debug!(file = %doc.filename, url = %self.url(&path), "create");

        let bytes = self.send(self.request(Method::POST, &path).json(&body)).await?;
        Ok(self.dialect.decode_document(&bytes)?)
    }

    async fn update(
        &self,
        collection: Collection,
        id: u64,
        doc: &Document,
    ) -> Result<RemoteDocument, ApiError> {
        let path = self.dialect.update_path(collection, id);
        let body = self.dialect.document_payload(collection, doc);
        tracing::debug!(file = %doc.filename, url = %self.url(&path), "update");

        let bytes = self.send(self.request(Method::POST, &path).json(&body)).await?;
        Ok(self.dialect.decode_document(&bytes)?)
    }

    async fn upload_media(&self, path: &Path, filename: &str) -> Result<RemoteMedia, ApiError> {
        let data = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.to_path_buf(),
            source,
        })?;

        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(mime_for(filename))?;
        let form = Form::new().part(self.dialect.media_field(), part);
        tracing::debug!(file = %filename, url = %self.url(self.dialect.media_path()), "upload");

        let bytes = self
            .send(self.request(Method::POST, self.dialect.media_path()).multipart(form))
            .await?;
        Ok(self.dialect.decode_media(&bytes)?)
    }

    async fn validate_token(&self) -> Result<(), ApiError> {
        let (method, path) = self.dialect.validate_request();
        self.send(self.request(method, path)).await?;
        Ok(())
    }
}

fn mime_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("cat.JPG"), "image/jpeg");
        assert_eq!(mime_for("a.b.png"), "image/png");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }

    #[test]
    fn test_url_join() {
        let mut cfg = Config::for_site("https://blog.test");
        cfg.site.token = "t".to_string();
        let api = HttpApi::new(&cfg).unwrap();
        assert_eq!(
            api.url(&Dialect::WpV2.update_path(Collection::Posts, 3)),
            "https://blog.test/wp-json/wp/v2/posts/3"
        );
    }
}
