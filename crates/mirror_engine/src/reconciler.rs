//! Reconciliation of one level of the remote tree against the local mirror.
//!
//! A run lists the root's children, scans the mirror, pushes every in-scope
//! page through convert → localize → diff → write, and finally (full scope
//! only) deletes mirror entries that no remote child claimed. Every decision
//! becomes one [`OutcomeRecord`]; only a failed listing or scan aborts a run.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::convert::ContentConverter;
use crate::document::build_page_document;
use crate::emitter::{OutcomeLog, OutcomeSender};
use crate::media::{AssetDownloader, MediaLocalizer, MediaSettings};
use crate::naming::MirrorEntry;
use crate::persist::{ensure_output_dir, remove_mirror_file, scan_mirror, write_mirror_file};
use crate::remote::{list_all_children, RemoteTree, MAX_PAGE_SIZE};
use crate::{NodeKind, OutcomeRecord, OutcomeStatus, RemoteNode, RunAbort, SyncReport, SyncScope};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const ROOT_TITLE: &str = "Root Page";
const SCAN_TITLE: &str = "File Scan";

#[derive(Clone)]
pub struct SyncConfig {
    pub content_root: PathBuf,
    /// Prepend a YAML block with title, type and date.
    pub front_matter: bool,
    pub media: MediaSettings,
    pub page_size: usize,
    /// Source of the run start time stamped on written files.
    pub clock: Clock,
}

impl SyncConfig {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            front_matter: false,
            media: MediaSettings::default(),
            page_size: MAX_PAGE_SIZE,
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("content_root", &self.content_root)
            .field("front_matter", &self.front_matter)
            .field("media", &self.media)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// Mirrors the children of a remote node into `content_root`.
///
/// The observer sender is cloned into every run; the receiving side sees the
/// channel close once the reconciler itself is dropped. A single reconciler
/// is expected per content root; concurrent runs on one root are not guarded.
pub struct Reconciler {
    config: SyncConfig,
    scope: SyncScope,
    remote: Arc<dyn RemoteTree>,
    converter: Arc<dyn ContentConverter>,
    media: MediaLocalizer,
    observer: Option<OutcomeSender>,
}

impl Reconciler {
    pub fn new(
        config: SyncConfig,
        remote: Arc<dyn RemoteTree>,
        converter: Arc<dyn ContentConverter>,
        downloader: Arc<dyn AssetDownloader>,
    ) -> Self {
        let media = MediaLocalizer::new(config.media.clone(), downloader);
        Self {
            config,
            scope: SyncScope::Full,
            remote,
            converter,
            media,
            observer: None,
        }
    }

    pub fn with_scope(mut self, scope: SyncScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_observer(mut self, observer: OutcomeSender) -> Self {
        self.observer = Some(observer);
        self
    }

    pub async fn sync(&self, root_id: &str) -> SyncReport {
        let started_at = (self.config.clock)();
        let root = self.config.content_root.as_path();
        let mut log = OutcomeLog::new(self.observer.clone());
        engine_info!(
            "Sync start root={} content_root={:?} scope={:?}",
            root_id,
            root,
            self.scope
        );

        let listing = list_all_children(self.remote.as_ref(), root_id, self.config.page_size).await;
        let children = match listing {
            Ok(children) => children,
            Err(err) => {
                engine_error!("Listing children of {} failed: {}", root_id, err);
                let record = OutcomeRecord::new(ROOT_TITLE, root, OutcomeStatus::Error, Utc::now())
                    .with_message(err.to_string());
                log.emit(record).await;
                return log.finish(Some(RunAbort::RemoteTree(err.to_string())));
            }
        };

        // Scanned before any write so the orphan diff sees the pre-run mirror.
        let existing = match scan_mirror(root) {
            Ok(existing) => existing,
            Err(err) => {
                engine_error!("Scanning {:?} failed: {}", root, err);
                let record = OutcomeRecord::new(SCAN_TITLE, root, OutcomeStatus::Error, Utc::now())
                    .with_message(err.to_string());
                log.emit(record).await;
                return log.finish(Some(RunAbort::MirrorScan(err.to_string())));
            }
        };

        let mut synced: BTreeSet<PathBuf> = BTreeSet::new();
        for node in &children {
            if !self.scope.includes(&node.id) {
                engine_debug!("Out of scope: {} ({})", node.title, node.id);
                continue;
            }
            let entry = MirrorEntry::for_title(root, &node.title);
            // Claimed before the pipeline runs: a failed page is never an orphan.
            synced.insert(entry.markup_path.clone());
            let record = self.sync_page(node, &entry, started_at).await;
            log.emit(record).await;
        }

        if self.scope.deletes_orphans() {
            for orphan in existing.difference(&synced) {
                log.emit(delete_orphan(orphan)).await;
            }
        }

        let report = log.finish(None);
        engine_info!(
            "Sync done root={} records={} created={} updated={} skipped={} errors={} deleted={}",
            root_id,
            report.records.len(),
            report.count(OutcomeStatus::Created),
            report.count(OutcomeStatus::Updated),
            report.count(OutcomeStatus::Skipped),
            report.count(OutcomeStatus::Error) + report.count(OutcomeStatus::DeleteError),
            report.count(OutcomeStatus::Deleted),
        );
        report
    }

    async fn sync_page(
        &self,
        node: &RemoteNode,
        entry: &MirrorEntry,
        started_at: DateTime<Utc>,
    ) -> OutcomeRecord {
        if node.kind != NodeKind::Page {
            let message = format!("unsupported node kind: {}", node.kind);
            return page_error(node, &entry.page_dir, message);
        }
        for dir in [&entry.page_dir, &entry.images_dir] {
            if let Err(err) = ensure_output_dir(dir) {
                return page_error(node, dir, err.to_string());
            }
        }

        let markdown = match self.converter.to_markup(&node.id).await {
            Ok(markdown) => markdown,
            Err(err) => return page_error(node, &entry.markup_path, err.to_string()),
        };
        let markdown = self
            .media
            .localize(&markdown, &entry.page_dir, &entry.slug)
            .await;

        let document = if self.config.front_matter {
            match build_page_document(&node.title, node.last_modified, &markdown) {
                Ok(document) => document,
                Err(err) => return page_error(node, &entry.markup_path, err.to_string()),
            }
        } else {
            markdown
        };

        let status = match fs::read(&entry.markup_path) {
            Ok(existing) if existing == document.as_bytes() => {
                engine_debug!("Unchanged: {:?}", entry.markup_path);
                return OutcomeRecord::new(
                    &node.title,
                    &entry.markup_path,
                    OutcomeStatus::Skipped,
                    node.last_modified,
                );
            }
            Ok(_) => OutcomeStatus::Updated,
            Err(err) if err.kind() == io::ErrorKind::NotFound => OutcomeStatus::Created,
            Err(err) => {
                let message = format!("cannot read existing file: {err}");
                return page_error(node, &entry.markup_path, message);
            }
        };

        if let Err(err) = write_mirror_file(&entry.markup_path, document.as_bytes(), started_at) {
            return page_error(node, &entry.markup_path, err.to_string());
        }
        engine_debug!("{}: {:?}", status, entry.markup_path);
        OutcomeRecord::new(&node.title, &entry.markup_path, status, started_at)
    }
}

fn page_error(node: &RemoteNode, path: &Path, message: String) -> OutcomeRecord {
    engine_warn!("{} ({}): {}", node.title, node.id, message);
    OutcomeRecord::new(&node.title, path, OutcomeStatus::Error, Utc::now()).with_message(message)
}

fn delete_orphan(path: &Path) -> OutcomeRecord {
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match remove_mirror_file(path) {
        Ok(()) => {
            engine_info!("Deleted orphan {:?}", path);
            OutcomeRecord::new(title, path, OutcomeStatus::Deleted, Utc::now())
        }
        Err(err) => {
            engine_warn!("Failed to delete orphan {:?}: {}", path, err);
            OutcomeRecord::new(title, path, OutcomeStatus::DeleteError, Utc::now())
                .with_message(err.to_string())
        }
    }
}
