//! Change detection.
//!
//! Local files are joined to manifest records by file name. A file with no
//! record is new; a file with a record is stale only when it was modified
//! strictly after the record's last sync. Equal timestamps count as
//! unchanged.

use crate::models::{Classification, LocalFile, MediaRecord, Record, StaleFile};

pub fn classify(locals: &[LocalFile], records: &[Record]) -> Classification {
    let mut out = Classification::default();

    for local in locals {
        match records.iter().find(|r| r.filename == local.filename) {
            None => out.new.push(local.clone()),
            Some(record) if local.modified > record.synced_at => {
                tracing::debug!(
                    file = %local.filename,
                    modified = local.modified.timestamp(),
                    synced = record.synced_at.timestamp(),
                    "modified since last sync"
                );
                out.stale.push(StaleFile {
                    local: local.clone(),
                    record: record.clone(),
                });
            }
            Some(_) => {
                tracing::debug!(file = %local.filename, "unchanged, skipping");
                out.unchanged.push(local.clone());
            }
        }
    }

    out
}

/// Media is never re-uploaded: any record for the file name is enough to
/// skip it.
pub fn classify_media(locals: &[LocalFile], records: &[MediaRecord]) -> Vec<LocalFile> {
    locals
        .iter()
        .filter(|local| {
            let exists = records.iter().any(|r| r.filename == local.filename);
            if exists {
                tracing::debug!(file = %local.filename, "media already uploaded, skipping");
            }
            !exists
        })
        .cloned()
        .collect()
}
