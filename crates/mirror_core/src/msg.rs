use crate::{Candidate, OutcomeRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Children of the root were listed for interactive selection.
    CandidatesLoaded(Vec<Candidate>),
    /// User toggled the candidate at this position of the listing.
    ToggleCandidate(usize),
    SelectAll,
    ClearSelection,
    /// User confirmed the current selection.
    ConfirmSelection,
    /// User quit before a run started.
    Quit,
    /// Non-interactive start: sync every child of the root.
    StartFullSync,
    /// Engine emitted one outcome record.
    OutcomeReceived(OutcomeRow),
    /// Engine run returned.
    RunFinished { aborted: bool },
}
