use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

pub type NodeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Page,
    /// Database-like node. Listed by the remote tree but not mirrored.
    Container,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Page => write!(f, "page"),
            NodeKind::Container => write!(f, "container"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: NodeId,
    pub title: String,
    pub kind: NodeKind,
    pub last_modified: DateTime<Utc>,
}

/// One page of a paginated child listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChildrenPage {
    pub nodes: Vec<RemoteNode>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncScope {
    /// Every child of the root. Enables orphan deletion.
    #[default]
    Full,
    /// Only the listed node ids. Never deletes.
    Selective(BTreeSet<NodeId>),
}

impl SyncScope {
    pub fn selective<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        SyncScope::Selective(ids.into_iter().map(Into::into).collect())
    }

    pub fn includes(&self, id: &str) -> bool {
        match self {
            SyncScope::Full => true,
            SyncScope::Selective(ids) => ids.contains(id),
        }
    }

    pub fn deletes_orphans(&self) -> bool {
        matches!(self, SyncScope::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    Created,
    Updated,
    Skipped,
    Error,
    Deleted,
    DeleteError,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Created => write!(f, "Created"),
            OutcomeStatus::Updated => write!(f, "Updated"),
            OutcomeStatus::Skipped => write!(f, "Skipped"),
            OutcomeStatus::Error => write!(f, "Error"),
            OutcomeStatus::Deleted => write!(f, "Deleted"),
            OutcomeStatus::DeleteError => write!(f, "Delete Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub title: String,
    pub path: PathBuf,
    pub status: OutcomeStatus,
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
}

impl OutcomeRecord {
    pub fn new(
        title: impl Into<String>,
        path: impl Into<PathBuf>,
        status: OutcomeStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            status,
            timestamp,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Why a run stopped before touching any page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunAbort {
    RemoteTree(String),
    MirrorScan(String),
}

impl fmt::Display for RunAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunAbort::RemoteTree(msg) => write!(f, "failed to list remote children: {msg}"),
            RunAbort::MirrorScan(msg) => write!(f, "failed to scan local mirror: {msg}"),
        }
    }
}

/// Ordered outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub records: Vec<OutcomeRecord>,
    pub abort: Option<RunAbort>,
}

impl SyncReport {
    pub fn is_aborted(&self) -> bool {
        self.abort.is_some()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}
