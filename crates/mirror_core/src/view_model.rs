use crate::{OutcomeKind, OutcomeRow, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub candidates: Vec<CandidateView>,
    pub selected_count: usize,
    pub rows: Vec<OutcomeRow>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateView {
    pub index: usize,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub deleted: usize,
    pub delete_errors: usize,
}

impl StatusCounts {
    pub fn from_rows(rows: &[OutcomeRow]) -> Self {
        let mut counts = Self::default();
        for row in rows {
            *counts.slot(row.kind) += 1;
        }
        counts
    }

    pub fn get(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Created => self.created,
            OutcomeKind::Updated => self.updated,
            OutcomeKind::Skipped => self.skipped,
            OutcomeKind::Error => self.errors,
            OutcomeKind::Deleted => self.deleted,
            OutcomeKind::DeleteError => self.delete_errors,
        }
    }

    pub fn total(&self) -> usize {
        OutcomeKind::ALL.iter().map(|&kind| self.get(kind)).sum()
    }

    pub fn failures(&self) -> usize {
        self.errors + self.delete_errors
    }

    fn slot(&mut self, kind: OutcomeKind) -> &mut usize {
        match kind {
            OutcomeKind::Created => &mut self.created,
            OutcomeKind::Updated => &mut self.updated,
            OutcomeKind::Skipped => &mut self.skipped,
            OutcomeKind::Error => &mut self.errors,
            OutcomeKind::Deleted => &mut self.deleted,
            OutcomeKind::DeleteError => &mut self.delete_errors,
        }
    }
}
