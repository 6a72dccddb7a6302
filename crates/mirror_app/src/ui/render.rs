use colored::{ColoredString, Colorize};
use mirror_core::{AppViewModel, CandidateView, OutcomeKind, OutcomeRow, StatusCounts};
use tabled::{settings::Style, Table, Tabled};

const STATUS_WIDTH: usize = 12;

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Page")]
    page: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Time")]
    time: String,
}

pub fn paint(kind: OutcomeKind, text: &str) -> ColoredString {
    match kind {
        OutcomeKind::Created => text.green(),
        OutcomeKind::Updated => text.cyan(),
        OutcomeKind::Skipped => text.dimmed(),
        OutcomeKind::Error | OutcomeKind::DeleteError => text.red().bold(),
        OutcomeKind::Deleted => text.yellow(),
    }
}

/// One progress line, printed as the record arrives.
pub fn live_line(row: &OutcomeRow) -> String {
    let label = format!("{:<width$}", row.kind.label(), width = STATUS_WIDTH);
    let mut line = format!("{} {}  {}", paint(row.kind, &label), row.title, row.path.dimmed());
    if let Some(message) = &row.message {
        line.push_str(&format!("  ({message})"));
    }
    line
}

pub fn candidate_line(candidate: &CandidateView) -> String {
    let mark = if candidate.selected { "[x]" } else { "[ ]" };
    format!("{mark} {:>3}. {}", candidate.index + 1, candidate.title)
}

pub fn summary_table(view: &AppViewModel) -> String {
    let rows = view.rows.iter().map(|row| SummaryRow {
        page: row.title.clone(),
        status: row.kind.label().to_string(),
        path: row.path.clone(),
        time: row.timestamp.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn legend() -> String {
    OutcomeKind::ALL
        .iter()
        .map(|&kind| format!("  {}  {}", paint(kind, kind.label()), kind.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn counts_line(counts: &StatusCounts) -> String {
    OutcomeKind::ALL
        .iter()
        .map(|&kind| format!("{}: {}", kind.label(), counts.get(kind)))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Table, legend and totals shown after a run.
pub fn summary(view: &AppViewModel) -> String {
    if view.rows.is_empty() {
        return "Nothing to sync.".to_string();
    }
    format!(
        "{}\n\nLegend:\n{}\n\n{} (total {})",
        summary_table(view),
        legend(),
        counts_line(&view.counts),
        view.counts.total()
    )
}
