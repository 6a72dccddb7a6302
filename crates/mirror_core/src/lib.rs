//! Mirror core: pure session state machine and view-model helpers for the
//! interactive front end.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, ExitReason, SelectionScope};
pub use msg::Msg;
pub use state::{AppState, Candidate, OutcomeKind, OutcomeRow, SessionState};
pub use update::update;
pub use view_model::{AppViewModel, CandidateView, StatusCounts};
