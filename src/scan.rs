use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::{Collection, LocalFile};

/// List the files of `collection` under the configured root.
///
/// A missing collection directory means the collection is not used and
/// yields no files; any other I/O error aborts the run.
pub fn scan_collection(config: &Config, collection: Collection) -> Result<Vec<LocalFile>> {
    let dir = config.collection_dir(collection);
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "{} directory not found, skipping", collection);
        return Ok(Vec::new());
    }
    scan_dir(&dir, config.extension(collection))
}

/// Non-recursive listing of `dir`, keeping regular files whose name contains
/// `extension`. Sorted by file name.
pub fn scan_dir(dir: &Path, extension: &str) -> Result<Vec<LocalFile>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(dir).min_depth(1).max_depth(1);
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if !filename.contains(extension) {
            continue;
        }

        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
        let modified = metadata
            .modified()
            .with_context(|| format!("No modification time for {}", entry.path().display()))?;

        files.push(LocalFile {
            filename,
            modified: DateTime::<Utc>::from(modified),
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(files)
}
