#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartSync { scope: SelectionScope },
    Exit { reason: ExitReason },
}

/// What the engine should sync. Selected ids keep listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionScope {
    Full,
    Selected(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Completed,
    Aborted,
    NothingSelected,
}
