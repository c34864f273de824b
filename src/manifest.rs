//! JSON manifests of previously synced files.
//!
//! Each collection keeps one manifest (`posts.json`, `pages.json`,
//! `media.json`) holding a flat array of records. It is read once at the
//! start of a run and rewritten whole at the end.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::{MediaRecord, Record};

pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in the manifest.
    ///
    /// A missing file is a first run. An unreadable or corrupt file is
    /// logged and treated the same way, so the run can proceed.
    pub fn load<T: DeserializeOwned>(&self) -> Vec<T> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "manifest does not exist, first run?");
            return Vec::new();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "error reading manifest");
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "error parsing manifest");
                Vec::new()
            }
        }
    }

    pub fn save<T: Serialize>(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records).context("Failed to encode manifest")?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "manifest written");
        Ok(())
    }

    /// Fold created and updated records into `existing` and persist.
    ///
    /// Returns `false` without touching the file when there is nothing new.
    pub fn write_records(
        &self,
        existing: Vec<Record>,
        created: &[Record],
        updated: &[Record],
    ) -> Result<bool> {
        if created.is_empty() && updated.is_empty() {
            return Ok(false);
        }
        let folded = fold_records(existing, created, updated);
        self.save(&folded)?;
        Ok(true)
    }

    /// Append uploaded media records to `existing` and persist.
    pub fn write_media(&self, existing: Vec<MediaRecord>, uploaded: &[MediaRecord]) -> Result<bool> {
        if uploaded.is_empty() {
            return Ok(false);
        }
        let folded = fold_media(existing, uploaded);
        self.save(&folded)?;
        Ok(true)
    }
}

/// Merge the outcome of a run into the records read at its start.
///
/// Existing records matched by an update get the new sync time, URL, and
/// status in place, keeping their position and remote id. Created records
/// are appended; one that shares a file name with an existing record
/// replaces it so file names stay unique.
pub fn fold_records(mut existing: Vec<Record>, created: &[Record], updated: &[Record]) -> Vec<Record> {
    for record in existing.iter_mut() {
        if let Some(up) = updated.iter().find(|u| u.filename == record.filename) {
            record.synced_at = up.synced_at;
            if !up.url.is_empty() {
                record.url = up.url.clone();
            }
            record.status = up.status.clone();
            if up.date.is_some() {
                record.date = up.date.clone();
            }
        }
    }

    for record in created {
        match existing.iter_mut().find(|e| e.filename == record.filename) {
            Some(slot) => *slot = record.clone(),
            None => existing.push(record.clone()),
        }
    }

    existing
}

pub fn fold_media(mut existing: Vec<MediaRecord>, uploaded: &[MediaRecord]) -> Vec<MediaRecord> {
    for record in uploaded {
        match existing.iter_mut().find(|e| e.filename == record.filename) {
            Some(slot) => *slot = record.clone(),
            None => existing.push(record.clone()),
        }
    }
    existing
}
