//! Create/update driver.
//!
//! Takes the `new` and `stale` sets from the classifier, loads every file,
//! then sends them to the remote site one at a time and merges what the
//! site returns with the local data into the records that the manifest
//! writer persists. A failed call is recorded and the loop moves on.
//!
//! Local read errors surface from [`Driver::load`], before the first call.
//! An error once sending has started (a broken prompt) stops the loop and
//! is parked in [`Outcome::interrupted`] next to the records gathered so
//! far, so the caller can persist them before reporting the error.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::api::{ApiError, RemoteApi, RemoteDocument, RemoteMedia};
use crate::frontmatter;
use crate::models::{Classification, Collection, Document, LocalFile, MediaRecord, Record};
use crate::prompt::Confirm;
use crate::render::Renderer;

/// A document the site refused or could not be reached for.
#[derive(Debug)]
pub struct Failure {
    pub filename: String,
    pub error: ApiError,
}

/// Documents of one collection, read and rendered, ready to send.
#[derive(Debug, Default)]
pub struct Pending {
    pub new: Vec<Document>,
    /// Each changed document with the record it was last synced as.
    pub stale: Vec<(Document, Record)>,
}

#[derive(Debug, Default)]
pub struct Outcome {
    pub records: Vec<Record>,
    /// Files the user chose not to send.
    pub declined: Vec<String>,
    pub failures: Vec<Failure>,
    /// Set when the loop stopped early. `records` still holds everything
    /// the site accepted before that.
    pub interrupted: Option<anyhow::Error>,
}

#[derive(Debug, Default)]
pub struct MediaOutcome {
    pub records: Vec<MediaRecord>,
    pub declined: Vec<String>,
    pub failures: Vec<Failure>,
    pub interrupted: Option<anyhow::Error>,
}

pub struct Driver<'a> {
    api: &'a dyn RemoteApi,
    confirm: &'a dyn Confirm,
    renderer: &'a dyn Renderer,
}

impl<'a> Driver<'a> {
    pub fn new(api: &'a dyn RemoteApi, confirm: &'a dyn Confirm, renderer: &'a dyn Renderer) -> Self {
        Self {
            api,
            confirm,
            renderer,
        }
    }

    /// Read and render every new and stale file under `dir`.
    ///
    /// Any unreadable file fails the whole load, and nothing has been sent.
    pub fn load(&self, dir: &Path, classification: &Classification) -> Result<Pending> {
        let mut pending = Pending::default();
        for local in &classification.new {
            pending.new.push(frontmatter::load(dir, local, self.renderer)?);
        }
        for stale in &classification.stale {
            let doc = frontmatter::load(dir, &stale.local, self.renderer)?;
            pending.stale.push((doc, stale.record.clone()));
        }
        Ok(pending)
    }

    /// Create every document in `new` on the site.
    pub async fn create_all(&self, collection: Collection, new: &[Document]) -> Outcome {
        let mut outcome = Outcome::default();

        for doc in new {
            let question = format!(
                "New {} {}, Continue (y/N)? ",
                collection.noun(),
                doc.filename
            );
            match self.confirm.confirm(&question) {
                Ok(true) => {}
                Ok(false) => {
                    outcome.declined.push(doc.filename.clone());
                    continue;
                }
                Err(e) => {
                    outcome.interrupted = Some(e);
                    break;
                }
            }

            let result = self
                .api
                .create(collection, doc)
                .await
                .and_then(|remote| created_record(doc, remote, Utc::now()));
            match result {
                Ok(record) => {
                    tracing::info!("New {}: {} {}", collection.noun(), doc.filename, record.url);
                    outcome.records.push(record);
                }
                Err(error) => {
                    tracing::warn!(file = %doc.filename, "Error creating {}: {}", collection.noun(), error);
                    outcome.failures.push(Failure {
                        filename: doc.filename.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// Re-send every changed document in full, keyed by its recorded id.
    pub async fn update_all(&self, collection: Collection, stale: &[(Document, Record)]) -> Outcome {
        let mut outcome = Outcome::default();

        for (doc, record) in stale {
            let question = format!(
                "Update {} {}, Continue (y/N)? ",
                collection.noun(),
                doc.filename
            );
            match self.confirm.confirm(&question) {
                Ok(true) => {}
                Ok(false) => {
                    outcome.declined.push(doc.filename.clone());
                    continue;
                }
                Err(e) => {
                    outcome.interrupted = Some(e);
                    break;
                }
            }

            match self.api.update(collection, record.id, doc).await {
                Ok(remote) => {
                    let updated = updated_record(record, doc, remote, Utc::now());
                    tracing::info!("Updated {}: {} {}", collection.noun(), doc.filename, updated.url);
                    tracing::debug!(synced = updated.synced_at.timestamp(), "sync time updated");
                    outcome.records.push(updated);
                }
                Err(error) => {
                    tracing::warn!(file = %doc.filename, "Error updating {}: {}", collection.noun(), error);
                    outcome.failures.push(Failure {
                        filename: doc.filename.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// Upload every file in `new` from the media directory.
    ///
    /// Media bytes are read by the API client, so an unreadable media file
    /// is a per-file [`ApiError::File`] failure rather than a fatal error.
    pub async fn upload_media(&self, dir: &Path, new: &[LocalFile]) -> MediaOutcome {
        let mut outcome = MediaOutcome::default();

        for local in new {
            let question = format!("Upload {}, Continue (y/N)? ", local.filename);
            match self.confirm.confirm(&question) {
                Ok(true) => {}
                Ok(false) => {
                    outcome.declined.push(local.filename.clone());
                    continue;
                }
                Err(e) => {
                    outcome.interrupted = Some(e);
                    break;
                }
            }

            let path = dir.join(&local.filename);
            match self.api.upload_media(&path, &local.filename).await {
                Ok(remote) => {
                    let record = media_record(&local.filename, remote);
                    tracing::info!("Uploaded: {} {}", local.filename, record.url);
                    outcome.records.push(record);
                }
                Err(error) => {
                    tracing::warn!(file = %local.filename, "Error uploading media: {}", error);
                    outcome.failures.push(Failure {
                        filename: local.filename.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }
}

/// Record for a freshly created document.
///
/// The server's status wins over the local one so a `draft` stays a draft in
/// the manifest; the local status is used only when the response omits it.
/// A response without an id cannot be updated later, so it counts as a
/// failed create.
pub fn created_record(
    doc: &Document,
    remote: RemoteDocument,
    now: DateTime<Utc>,
) -> Result<Record, ApiError> {
    if remote.id == 0 {
        return Err(ApiError::Decode(<serde_json::Error as serde::de::Error>::custom(
            "response carried no id",
        )));
    }
    Ok(Record {
        filename: doc.filename.clone(),
        id: remote.id,
        url: remote.url,
        status: remote.status.unwrap_or_else(|| doc.status.clone()),
        date: remote.date,
        synced_at: now,
    })
}

/// Record after a successful full update. The remote id never changes.
pub fn updated_record(
    prior: &Record,
    doc: &Document,
    remote: RemoteDocument,
    now: DateTime<Utc>,
) -> Record {
    Record {
        filename: prior.filename.clone(),
        id: prior.id,
        url: if remote.url.is_empty() {
            prior.url.clone()
        } else {
            remote.url
        },
        status: remote.status.unwrap_or_else(|| doc.status.clone()),
        date: remote.date.or_else(|| prior.date.clone()),
        synced_at: now,
    }
}

pub fn media_record(filename: &str, remote: RemoteMedia) -> MediaRecord {
    MediaRecord {
        filename: filename.to_string(),
        id: remote.id,
        url: remote.url,
        link: remote.link,
    }
}
