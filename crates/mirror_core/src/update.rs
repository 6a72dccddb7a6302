use crate::{AppState, Effect, ExitReason, Msg, SelectionScope, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::CandidatesLoaded(candidates) => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            state.load_candidates(candidates);
            if state.has_candidates() {
                state.set_session(SessionState::Selecting);
                Vec::new()
            } else {
                state.set_session(SessionState::Cancelled);
                vec![Effect::Exit {
                    reason: ExitReason::NothingSelected,
                }]
            }
        }
        Msg::ToggleCandidate(index) => {
            if state.session() == SessionState::Selecting {
                state.toggle(index);
            }
            Vec::new()
        }
        Msg::SelectAll => {
            if state.session() == SessionState::Selecting {
                state.select_all();
            }
            Vec::new()
        }
        Msg::ClearSelection => {
            if state.session() == SessionState::Selecting {
                state.clear_selection();
            }
            Vec::new()
        }
        Msg::ConfirmSelection => {
            let ids = state.selected_ids();
            // Confirming needs at least one selected page.
            if state.session() != SessionState::Selecting || ids.is_empty() {
                return (state, Vec::new());
            }
            state.set_session(SessionState::Syncing);
            vec![Effect::StartSync {
                scope: SelectionScope::Selected(ids),
            }]
        }
        Msg::Quit => match state.session() {
            SessionState::Idle | SessionState::Selecting => {
                state.set_session(SessionState::Cancelled);
                vec![Effect::Exit {
                    reason: ExitReason::NothingSelected,
                }]
            }
            _ => Vec::new(),
        },
        Msg::StartFullSync => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            state.set_session(SessionState::Syncing);
            vec![Effect::StartSync {
                scope: SelectionScope::Full,
            }]
        }
        Msg::OutcomeReceived(row) => {
            if state.session() == SessionState::Syncing {
                state.push_row(row);
            }
            Vec::new()
        }
        Msg::RunFinished { aborted } => {
            if state.session() != SessionState::Syncing {
                return (state, Vec::new());
            }
            let (session, reason) = if aborted {
                (SessionState::Aborted, ExitReason::Aborted)
            } else {
                (SessionState::Finished, ExitReason::Completed)
            };
            state.set_session(session);
            vec![Effect::Exit { reason }]
        }
    };

    (state, effects)
}
