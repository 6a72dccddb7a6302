//! `notion-mirror`: mirror the child pages of a Notion page into a local
//! markdown content tree.
//!
//! ```text
//! notion-mirror --url https://www.notion.so/Blog-<id> [--content-dir ./content]
//!               [--front-matter] [--interactive] [--s3-images] [-v]
//! ```

mod config;
mod run;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use engine_logging::{engine_info, LogDestination};

use config::{default_config_path, load_file_config, resolve, CliOverrides};

#[derive(Debug, Parser)]
#[command(
    name = "notion-mirror",
    version,
    about = "Mirror the child pages of a Notion page into a local markdown tree"
)]
struct Cli {
    /// Notion integration token (NOTION_TOKEN).
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,
    /// URL of the root page whose children are mirrored (NOTION_URL).
    #[arg(long, value_name = "URL")]
    url: Option<String>,
    /// Directory holding one sub-directory per page (NOTION_CONTENT_DIR).
    #[arg(long, value_name = "PATH")]
    content_dir: Option<PathBuf>,
    /// Prepend YAML front matter with title, type and date.
    #[arg(long)]
    front_matter: bool,
    /// Pick the pages to sync instead of mirroring all of them.
    #[arg(short, long)]
    interactive: bool,
    /// Prefix for rewritten image links, e.g. `/posts`.
    #[arg(long, value_name = "URI")]
    posts_base_uri: Option<String>,
    /// Images are hosted remotely; keep their links as-is.
    #[arg(long)]
    s3_images: bool,
    /// Do not download images that already exist locally.
    #[arg(long)]
    reuse_assets: bool,
    /// Children requested per listing call (1-100).
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,
    /// Notion API base URL.
    #[arg(long, value_name = "URL", hide = true)]
    api_base: Option<String>,
    /// YAML config file [default: ~/.notion-mirror.yml].
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log file [default: ./notion-mirror.log].
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Also log to the terminal; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            notion_token: self.token.clone(),
            notion_url: self.url.clone(),
            content_dir: self.content_dir.clone(),
            front_matter: self.front_matter.then_some(true),
            interactive: self.interactive.then_some(true),
            posts_base_uri: self.posts_base_uri.clone(),
            s3_images: self.s3_images.then_some(true),
            reuse_assets: self.reuse_assets.then_some(true),
            page_size: self.page_size,
            api_base: self.api_base.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    match run_cli(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.clone().or_else(default_config_path);
    let file = match &config_path {
        Some(path) => load_file_config(path)?,
        None => Default::default(),
    };
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let settings = resolve(&cli.overrides(), |name| std::env::var(name).ok(), &file, &cwd)?;

    let destination = if cli.verbose > 0 {
        LogDestination::Both(settings.log_file.clone())
    } else {
        LogDestination::File(settings.log_file.clone())
    };
    engine_logging::initialize(destination, engine_logging::level_from_verbosity(cli.verbose));
    engine_info!(
        "notion-mirror {} content_dir={:?} interactive={} front_matter={}",
        env!("CARGO_PKG_VERSION"),
        settings.content_dir,
        settings.interactive,
        settings.front_matter
    );

    run::execute(settings).await
}
