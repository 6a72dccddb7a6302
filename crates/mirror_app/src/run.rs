//! Wires settings, the Notion adapter and the reconciler together and feeds
//! engine outcomes into the presentation state machine.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone};
use engine_logging::engine_info;
use mirror_core::{
    update, AppState, Candidate, Effect, ExitReason, Msg, OutcomeKind, OutcomeRow, SelectionScope,
};
use mirror_engine::{
    list_all_children, observer_channel, page_id_from_url, DownloadSettings, MediaSettings,
    NotionClient, NotionSettings, OutcomeRecord, OutcomeStatus, Reconciler,
    ReqwestAssetDownloader, SyncConfig, SyncScope, DEFAULT_OBSERVER_CAPACITY,
};

use crate::config::Settings;
use crate::ui::{render, select};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn execute(settings: Settings) -> Result<ExitCode> {
    let root_id = page_id_from_url(&settings.notion_url)
        .with_context(|| format!("invalid Notion page URL {}", settings.notion_url))?;

    let mut notion_settings = NotionSettings::new(settings.notion_token.clone());
    notion_settings.api_base = settings.api_base.clone();
    let client = Arc::new(NotionClient::new(notion_settings).context("failed to build HTTP client")?);

    let (state, effects) = if settings.interactive {
        choose_pages(&client, &root_id, settings.page_size).await?
    } else {
        update(AppState::new(), Msg::StartFullSync)
    };

    match effects.into_iter().next() {
        Some(Effect::StartSync { scope }) => sync(state, &settings, client, &root_id, scope).await,
        Some(Effect::Exit { reason }) => {
            engine_info!("Exiting before sync: {:?}", reason);
            println!("No pages selected");
            Ok(ExitCode::SUCCESS)
        }
        None => bail!("session ended in {:?} without starting a sync", state.session()),
    }
}

async fn choose_pages(
    client: &NotionClient,
    root_id: &str,
    page_size: usize,
) -> Result<(AppState, Vec<Effect>)> {
    let nodes = list_all_children(client, root_id, page_size)
        .await
        .context("failed to list pages under the root page")?;
    let candidates = nodes
        .into_iter()
        .map(|node| Candidate {
            id: node.id,
            title: node.title,
        })
        .collect();

    let (state, effects) = update(AppState::new(), Msg::CandidatesLoaded(candidates));
    if !effects.is_empty() {
        return Ok((state, effects));
    }
    let outcome = tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        select::prompt(state, stdin.lock(), &mut stdout)
    })
    .await
    .context("selection prompt panicked")?;
    outcome.context("failed to read selection")
}

async fn sync(
    state: AppState,
    settings: &Settings,
    client: Arc<NotionClient>,
    root_id: &str,
    scope: SelectionScope,
) -> Result<ExitCode> {
    let downloader =
        ReqwestAssetDownloader::new(DownloadSettings::default()).context("failed to build HTTP client")?;
    let config = SyncConfig {
        front_matter: settings.front_matter,
        media: MediaSettings {
            enabled: !settings.s3_images,
            base_uri: settings.posts_base_uri.clone(),
            reuse_existing: settings.reuse_assets,
        },
        page_size: settings.page_size,
        ..SyncConfig::new(&settings.content_dir)
    };
    let scope = match scope {
        SelectionScope::Full => SyncScope::Full,
        SelectionScope::Selected(ids) => SyncScope::selective(ids),
    };

    let (tx, mut rx) = observer_channel(DEFAULT_OBSERVER_CAPACITY);
    let reconciler = Reconciler::new(config, client.clone(), client, Arc::new(downloader))
        .with_scope(scope)
        .with_observer(tx);

    println!("Syncing into {}", settings.content_dir.display());
    let progress = tokio::spawn(async move {
        let mut state = state;
        while let Some(record) = rx.recv().await {
            let row = to_row(&record);
            println!("{}", render::live_line(&row));
            state = update(state, Msg::OutcomeReceived(row)).0;
        }
        state
    });

    let report = reconciler.sync(root_id).await;
    // Closes the observer channel so the progress task drains and returns.
    drop(reconciler);
    let state = progress.await.context("progress printer panicked")?;

    let (state, effects) = update(
        state,
        Msg::RunFinished {
            aborted: report.is_aborted(),
        },
    );
    println!();
    println!("{}", render::summary(&state.view()));

    let aborted = effects.iter().any(|effect| {
        matches!(
            effect,
            Effect::Exit {
                reason: ExitReason::Aborted
            }
        )
    });
    if let Some(abort) = &report.abort {
        eprintln!("Sync aborted: {abort}");
    }
    Ok(if aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn to_row(record: &OutcomeRecord) -> OutcomeRow {
    OutcomeRow {
        title: record.title.clone(),
        path: record.path.display().to_string(),
        kind: map_status(record.status),
        timestamp: format_timestamp(&record.timestamp.with_timezone(&chrono::Local)),
        message: record.message.clone(),
    }
}

pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn map_status(status: OutcomeStatus) -> OutcomeKind {
    match status {
        OutcomeStatus::Created => OutcomeKind::Created,
        OutcomeStatus::Updated => OutcomeKind::Updated,
        OutcomeStatus::Skipped => OutcomeKind::Skipped,
        OutcomeStatus::Error => OutcomeKind::Error,
        OutcomeStatus::Deleted => OutcomeKind::Deleted,
        OutcomeStatus::DeleteError => OutcomeKind::DeleteError,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;

    use super::*;

    #[test]
    fn timestamps_use_date_time_format() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 9, 5, 7).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-02-01 09:05:07");
    }

    #[test]
    fn records_map_to_rows() {
        let record = OutcomeRecord::new(
            "old_post.md",
            PathBuf::from("/site/content/old_post/old_post.md"),
            OutcomeStatus::DeleteError,
            Utc::now(),
        )
        .with_message("permission denied");

        let row = to_row(&record);
        assert_eq!(row.kind, OutcomeKind::DeleteError);
        assert_eq!(row.path, "/site/content/old_post/old_post.md");
        assert_eq!(row.message.as_deref(), Some("permission denied"));
        assert_eq!(row.timestamp.len(), "YYYY-MM-DD HH:MM:SS".len());
    }
}
