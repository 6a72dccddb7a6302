use std::collections::BTreeSet;

use crate::view_model::{AppViewModel, CandidateView, StatusCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Selecting,
    Syncing,
    Finished,
    Aborted,
    Cancelled,
}

/// A child of the root offered for interactive selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Created,
    Updated,
    Skipped,
    Error,
    Deleted,
    DeleteError,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 6] = [
        OutcomeKind::Created,
        OutcomeKind::Updated,
        OutcomeKind::Skipped,
        OutcomeKind::Error,
        OutcomeKind::Deleted,
        OutcomeKind::DeleteError,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Created => "Created",
            OutcomeKind::Updated => "Updated",
            OutcomeKind::Skipped => "Skipped",
            OutcomeKind::Error => "Error",
            OutcomeKind::Deleted => "Deleted",
            OutcomeKind::DeleteError => "Delete Error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OutcomeKind::Created => "new page written to the mirror",
            OutcomeKind::Updated => "existing page rewritten with new content",
            OutcomeKind::Skipped => "content unchanged, file left untouched",
            OutcomeKind::Error => "page could not be synced",
            OutcomeKind::Deleted => "local page no longer exists remotely",
            OutcomeKind::DeleteError => "orphaned page could not be removed",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, OutcomeKind::Error | OutcomeKind::DeleteError)
    }
}

/// One outcome as the front end displays it. Timestamps are preformatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRow {
    pub title: String,
    pub path: String,
    pub kind: OutcomeKind,
    pub timestamp: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    session: SessionState,
    candidates: Vec<Candidate>,
    selected: BTreeSet<usize>,
    rows: Vec<OutcomeRow>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn view(&self) -> AppViewModel {
        let candidates = self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| CandidateView {
                index,
                title: candidate.title.clone(),
                selected: self.selected.contains(&index),
            })
            .collect();
        AppViewModel {
            session: self.session,
            candidates,
            selected_count: self.selected.len(),
            rows: self.rows.clone(),
            counts: StatusCounts::from_rows(&self.rows),
        }
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
    }

    pub(crate) fn load_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.selected.clear();
    }

    pub(crate) fn has_candidates(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub(crate) fn toggle(&mut self, index: usize) -> bool {
        if index >= self.candidates.len() {
            return false;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        true
    }

    pub(crate) fn select_all(&mut self) {
        self.selected = (0..self.candidates.len()).collect();
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected ids in listing order.
    pub(crate) fn selected_ids(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|&index| self.candidates.get(index))
            .map(|candidate| candidate.id.clone())
            .collect()
    }

    pub(crate) fn push_row(&mut self, row: OutcomeRow) {
        self.rows.push(row);
    }
}
