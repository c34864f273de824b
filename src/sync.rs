//! Sync orchestration.
//!
//! Runs posts, then pages, then media. Each collection is scanned,
//! classified against its manifest, pushed through the [`Driver`], and its
//! manifest rewritten. In dry-run mode only the classification is reported.

use anyhow::Result;

use crate::api::RemoteApi;
use crate::classify::{classify, classify_media};
use crate::config::Config;
use crate::manifest::ManifestStore;
use crate::models::{Collection, MediaRecord, Record};
use crate::prompt::Confirm;
use crate::reconcile::{Driver, Failure, Outcome};
use crate::render::Renderer;
use crate::scan::scan_collection;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    /// Restrict the run to one collection.
    pub only: Option<Collection>,
}

#[derive(Debug)]
pub struct CollectionReport {
    pub collection: Collection,
    pub found: usize,
    pub new: Vec<String>,
    pub stale: Vec<String>,
    pub unchanged: usize,
    pub created: usize,
    pub updated: usize,
    pub declined: Vec<String>,
    pub failures: Vec<Failure>,
    pub manifest_written: bool,
}

impl CollectionReport {
    fn new(collection: Collection, found: usize) -> Self {
        Self {
            collection,
            found,
            new: Vec::new(),
            stale: Vec::new(),
            unchanged: 0,
            created: 0,
            updated: 0,
            declined: Vec::new(),
            failures: Vec::new(),
            manifest_written: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub dry_run: bool,
    pub collections: Vec<CollectionReport>,
}

impl SyncReport {
    pub fn failure_count(&self) -> usize {
        self.collections.iter().map(|c| c.failures.len()).sum()
    }
}

pub async fn run_sync(
    config: &Config,
    api: &dyn RemoteApi,
    confirm: &dyn Confirm,
    renderer: &dyn Renderer,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let driver = Driver::new(api, confirm, renderer);
    let mut report = SyncReport {
        dry_run: options.dry_run,
        collections: Vec::new(),
    };

    for collection in Collection::ALL {
        if options.only.is_some_and(|only| only != collection) {
            continue;
        }
        let collection_report = match collection {
            Collection::Media => sync_media(config, &driver, options.dry_run).await?,
            _ => sync_documents(config, collection, &driver, options.dry_run).await?,
        };
        report.collections.push(collection_report);
    }

    Ok(report)
}

pub async fn sync_documents(
    config: &Config,
    collection: Collection,
    driver: &Driver<'_>,
    dry_run: bool,
) -> Result<CollectionReport> {
    let locals = scan_collection(config, collection)?;
    let store = ManifestStore::new(config.manifest_path(collection));
    let existing: Vec<Record> = store.load();

    let classification = classify(&locals, &existing);
    let mut report = CollectionReport::new(collection, locals.len());
    report.new = classification.new.iter().map(|f| f.filename.clone()).collect();
    report.stale = classification
        .stale
        .iter()
        .map(|s| s.local.filename.clone())
        .collect();
    report.unchanged = classification.unchanged.len();

    if dry_run || classification.is_settled() {
        return Ok(report);
    }

    let dir = config.collection_dir(collection);
    let pending = driver.load(&dir, &classification)?;

    let mut created = driver.create_all(collection, &pending.new).await;
    let mut updated = match created.interrupted {
        Some(_) => Outcome::default(),
        None => driver.update_all(collection, &pending.stale).await,
    };

    report.created = created.records.len();
    report.updated = updated.records.len();
    // Accepted records are persisted even when the loop was interrupted.
    report.manifest_written = store.write_records(existing, &created.records, &updated.records)?;
    if !report.manifest_written {
        tracing::info!("No {} to write.", collection);
    }

    if let Some(e) = created.interrupted.take().or(updated.interrupted.take()) {
        return Err(e.context(format!("{} sync interrupted", collection)));
    }

    report.declined.extend(created.declined);
    report.declined.extend(updated.declined);
    report.failures.extend(created.failures);
    report.failures.extend(updated.failures);
    Ok(report)
}

pub async fn sync_media(
    config: &Config,
    driver: &Driver<'_>,
    dry_run: bool,
) -> Result<CollectionReport> {
    let locals = scan_collection(config, Collection::Media)?;
    let store = ManifestStore::new(config.manifest_path(Collection::Media));
    let existing: Vec<MediaRecord> = store.load();

    let new = classify_media(&locals, &existing);
    let mut report = CollectionReport::new(Collection::Media, locals.len());
    report.new = new.iter().map(|f| f.filename.clone()).collect();
    report.unchanged = locals.len() - new.len();

    if dry_run || new.is_empty() {
        return Ok(report);
    }

    let mut uploaded = driver
        .upload_media(&config.collection_dir(Collection::Media), &new)
        .await;
    report.created = uploaded.records.len();
    report.manifest_written = store.write_media(existing, &uploaded.records)?;
    if let Some(e) = uploaded.interrupted.take() {
        return Err(e.context("media sync interrupted"));
    }
    report.declined = uploaded.declined;
    report.failures = uploaded.failures;
    Ok(report)
}

/// Print a summary of the run on stdout.
pub fn print_report(report: &SyncReport) {
    for c in &report.collections {
        if report.dry_run {
            println!("sync {} (dry-run)", c.collection);
        } else {
            println!("sync {}", c.collection);
        }
        println!("  found: {}", c.found);
        println!("  new: {}", c.new.len());
        for name in &c.new {
            println!("    + {}", name);
        }
        if c.collection != Collection::Media {
            println!("  stale: {}", c.stale.len());
            for name in &c.stale {
                println!("    ~ {}", name);
            }
        }
        println!("  unchanged: {}", c.unchanged);

        if report.dry_run {
            continue;
        }
        println!("  created: {}", c.created);
        if c.collection != Collection::Media {
            println!("  updated: {}", c.updated);
        }
        if !c.declined.is_empty() {
            println!("  declined: {}", c.declined.len());
        }
        println!("  failed: {}", c.failures.len());
        for f in &c.failures {
            println!("    ! {}: {}", f.filename, f.error);
        }
    }

    if report.failure_count() == 0 {
        println!("ok");
    }
}
