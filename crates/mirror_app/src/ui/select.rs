//! Line-based interactive page selection.

use std::io::{self, BufRead, Write};

use mirror_core::{update, AppState, Effect, Msg, SessionState};

use super::render::candidate_line;

const PROMPT: &str =
    "Toggle pages by number (e.g. `1 3`), `a` all, `n` none, Enter to sync, `q` to quit: ";

/// Parses one input line into messages. `None` for unrecognized input.
pub fn parse_command(line: &str) -> Option<Vec<Msg>> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return Some(vec![Msg::ConfirmSelection]),
        "q" | "quit" => return Some(vec![Msg::Quit]),
        "a" | "all" => return Some(vec![Msg::SelectAll]),
        "n" | "none" => return Some(vec![Msg::ClearSelection]),
        _ => {}
    }
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| match token.parse::<usize>() {
            Ok(number) if number > 0 => Some(Msg::ToggleCandidate(number - 1)),
            _ => None,
        })
        .collect()
}

/// Runs the prompt until the state machine asks to start a sync or exit.
/// End of input counts as quitting.
pub fn prompt<R, W>(
    mut state: AppState,
    mut input: R,
    out: &mut W,
) -> io::Result<(AppState, Vec<Effect>)>
where
    R: BufRead,
    W: Write,
{
    loop {
        let view = state.view();
        writeln!(out)?;
        for candidate in &view.candidates {
            writeln!(out, "{}", candidate_line(candidate))?;
        }
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let mut line = String::new();
        let msgs = if input.read_line(&mut line)? == 0 {
            vec![Msg::Quit]
        } else {
            match parse_command(&line) {
                Some(msgs) => msgs,
                None => {
                    writeln!(out, "Unrecognized input: {}", line.trim())?;
                    continue;
                }
            }
        };

        let mut effects = Vec::new();
        for msg in msgs {
            let (next, mut produced) = update(state, msg);
            state = next;
            effects.append(&mut produced);
        }
        if !effects.is_empty() {
            return Ok((state, effects));
        }
        if state.session() == SessionState::Selecting && line.trim().is_empty() {
            writeln!(out, "Select at least one page, or `q` to quit.")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use mirror_core::{Candidate, ExitReason, SelectionScope};
    use pretty_assertions::assert_eq;

    use super::*;

    fn loaded() -> AppState {
        let candidates = vec![
            Candidate {
                id: "p1".into(),
                title: "Intro".into(),
            },
            Candidate {
                id: "p2".into(),
                title: "Second".into(),
            },
        ];
        update(AppState::new(), Msg::CandidatesLoaded(candidates)).0
    }

    #[test]
    fn parses_numbers_and_keywords() {
        assert_eq!(
            parse_command("1, 2 "),
            Some(vec![Msg::ToggleCandidate(0), Msg::ToggleCandidate(1)])
        );
        assert_eq!(parse_command("\n"), Some(vec![Msg::ConfirmSelection]));
        assert_eq!(parse_command("Q"), Some(vec![Msg::Quit]));
        assert_eq!(parse_command("a"), Some(vec![Msg::SelectAll]));
        assert_eq!(parse_command("0"), None);
        assert_eq!(parse_command("two"), None);
    }

    #[test]
    fn empty_confirm_reprompts_then_selection_starts_sync() {
        let input = "\nx\n2\n\n".as_bytes();
        let mut out = Vec::new();
        let (state, effects) = prompt(loaded(), input, &mut out).unwrap();

        assert_eq!(state.session(), SessionState::Syncing);
        assert_eq!(
            effects,
            vec![Effect::StartSync {
                scope: SelectionScope::Selected(vec!["p2".to_string()]),
            }]
        );
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Select at least one page"));
        assert!(text.contains("Unrecognized input: x"));
        assert!(text.contains("[x]   2. Second"));
    }

    #[test]
    fn end_of_input_quits() {
        let mut out = Vec::new();
        let (state, effects) = prompt(loaded(), "".as_bytes(), &mut out).unwrap();
        assert_eq!(state.session(), SessionState::Cancelled);
        assert_eq!(
            effects,
            vec![Effect::Exit {
                reason: ExitReason::NothingSelected,
            }]
        );
    }
}
