//! Settings resolution: CLI flag, then `NOTION_*` environment, then the YAML
//! config file, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mirror_engine::{DEFAULT_API_BASE, MAX_PAGE_SIZE};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = ".notion-mirror.yml";
pub const DEFAULT_CONTENT_DIR: &str = "./content";

/// Contents of `~/.notion-mirror.yml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub notion_token: Option<String>,
    pub notion_url: Option<String>,
    pub content_dir: Option<PathBuf>,
    pub front_matter: Option<bool>,
    pub interactive: Option<bool>,
    pub posts_base_uri: Option<String>,
    pub s3_images: Option<bool>,
    pub reuse_assets: Option<bool>,
    pub page_size: Option<usize>,
    pub api_base: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line; `None` defers to the next source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub notion_token: Option<String>,
    pub notion_url: Option<String>,
    pub content_dir: Option<PathBuf>,
    pub front_matter: Option<bool>,
    pub interactive: Option<bool>,
    pub posts_base_uri: Option<String>,
    pub s3_images: Option<bool>,
    pub reuse_assets: Option<bool>,
    pub page_size: Option<usize>,
    pub api_base: Option<String>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub notion_token: String,
    pub notion_url: String,
    pub content_dir: PathBuf,
    pub front_matter: bool,
    pub interactive: bool,
    pub posts_base_uri: String,
    /// Images are hosted remotely; markup is left untouched.
    pub s3_images: bool,
    pub reuse_assets: bool,
    pub page_size: usize,
    pub api_base: String,
    pub log_file: PathBuf,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

/// Loads the YAML config. A missing file is an empty config.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Merges the sources. `env` looks up a variable by name; relative content
/// directories are resolved against `cwd`.
pub fn resolve<E>(cli: &CliOverrides, env: E, file: &FileConfig, cwd: &Path) -> Result<Settings>
where
    E: Fn(&str) -> Option<String>,
{
    let env_string = |name: &str| {
        env(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let env_bool = |name: &str| -> Result<Option<bool>> {
        env_string(name)
            .map(|value| parse_bool(&value).with_context(|| format!("invalid value for {name}")))
            .transpose()
    };

    let notion_token = cli
        .notion_token
        .clone()
        .or_else(|| env_string("NOTION_TOKEN"))
        .or_else(|| file.notion_token.clone());
    let Some(notion_token) = notion_token else {
        bail!("missing Notion API token: pass --token, set NOTION_TOKEN or add notion_token to the config file");
    };
    let notion_url = cli
        .notion_url
        .clone()
        .or_else(|| env_string("NOTION_URL"))
        .or_else(|| file.notion_url.clone());
    let Some(notion_url) = notion_url else {
        bail!("missing root page URL: pass --url, set NOTION_URL or add notion_url to the config file");
    };

    let content_dir = cli
        .content_dir
        .clone()
        .or_else(|| env_string("NOTION_CONTENT_DIR").map(PathBuf::from))
        .or_else(|| file.content_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR));
    let content_dir = if content_dir.is_absolute() {
        content_dir
    } else {
        cwd.join(content_dir.strip_prefix(".").unwrap_or(content_dir.as_path()))
    };

    let page_size = match cli.page_size {
        Some(size) => Some(size),
        None => env_string("NOTION_PAGE_SIZE")
            .map(|value| {
                value
                    .parse::<usize>()
                    .with_context(|| format!("invalid value for NOTION_PAGE_SIZE: {value}"))
            })
            .transpose()?,
    }
    .or(file.page_size)
    .unwrap_or(MAX_PAGE_SIZE)
    .clamp(1, MAX_PAGE_SIZE);

    Ok(Settings {
        notion_token,
        notion_url,
        content_dir,
        front_matter: pick_flag(cli.front_matter, env_bool("NOTION_FRONT_MATTER")?, file.front_matter),
        interactive: pick_flag(cli.interactive, env_bool("NOTION_INTERACTIVE")?, file.interactive),
        posts_base_uri: cli
            .posts_base_uri
            .clone()
            .or_else(|| env_string("NOTION_POSTS_BASE_URI"))
            .or_else(|| file.posts_base_uri.clone())
            .unwrap_or_default(),
        s3_images: pick_flag(cli.s3_images, env_bool("NOTION_S3_IMAGES")?, file.s3_images),
        reuse_assets: pick_flag(cli.reuse_assets, env_bool("NOTION_REUSE_ASSETS")?, file.reuse_assets),
        page_size,
        api_base: cli
            .api_base
            .clone()
            .or_else(|| env_string("NOTION_API_BASE"))
            .or_else(|| file.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        log_file: cli
            .log_file
            .clone()
            .or_else(|| env_string("NOTION_LOG_FILE").map(PathBuf::from))
            .or_else(|| file.log_file.clone())
            .unwrap_or_else(|| PathBuf::from(engine_logging::DEFAULT_LOG_FILE)),
    })
}

fn pick_flag(cli: Option<bool>, env: Option<bool>, file: Option<bool>) -> bool {
    cli.or(env).or(file).unwrap_or(false)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn no_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[])
    }

    fn minimal_file() -> FileConfig {
        FileConfig {
            notion_token: Some("file-token".into()),
            notion_url: Some("https://www.notion.so/Blog-abc123".into()),
            ..FileConfig::default()
        }
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let settings =
            resolve(&CliOverrides::default(), no_env(), &minimal_file(), Path::new("/work")).unwrap();

        assert_eq!(settings.notion_token, "file-token");
        assert_eq!(settings.content_dir, Path::new("/work/content"));
        assert!(!settings.front_matter);
        assert!(!settings.interactive);
        assert!(!settings.s3_images);
        assert_eq!(settings.posts_base_uri, "");
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.log_file, Path::new(engine_logging::DEFAULT_LOG_FILE));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let env = env_from(&[("NOTION_TOKEN", "env-token"), ("NOTION_FRONT_MATTER", "true")]);
        let cli = CliOverrides {
            notion_token: Some("cli-token".into()),
            ..CliOverrides::default()
        };
        let file = FileConfig {
            front_matter: Some(false),
            ..minimal_file()
        };

        let settings = resolve(&cli, &env, &file, Path::new("/work")).unwrap();
        assert_eq!(settings.notion_token, "cli-token");
        assert!(settings.front_matter);

        let settings = resolve(&CliOverrides::default(), &env, &file, Path::new("/work")).unwrap();
        assert_eq!(settings.notion_token, "env-token");
    }

    #[test]
    fn missing_token_is_an_error() {
        let file = FileConfig {
            notion_token: None,
            ..minimal_file()
        };
        let err = resolve(&CliOverrides::default(), no_env(), &file, Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn invalid_env_bool_is_reported() {
        let env = env_from(&[("NOTION_S3_IMAGES", "maybe")]);
        let err = resolve(&CliOverrides::default(), env, &minimal_file(), Path::new("/")).unwrap_err();
        assert!(format!("{err:#}").contains("NOTION_S3_IMAGES"));
    }

    #[test]
    fn page_size_is_clamped() {
        let file = FileConfig {
            page_size: Some(500),
            ..minimal_file()
        };
        let settings = resolve(&CliOverrides::default(), no_env(), &file, Path::new("/")).unwrap();
        assert_eq!(settings.page_size, 100);

        let cli = CliOverrides {
            page_size: Some(0),
            ..CliOverrides::default()
        };
        let settings = resolve(&cli, no_env(), &file, Path::new("/")).unwrap();
        assert_eq!(settings.page_size, 1);
    }

    #[test]
    fn absolute_content_dir_is_kept() {
        let env = env_from(&[("NOTION_CONTENT_DIR", "/srv/site/content")]);
        let settings = resolve(&CliOverrides::default(), env, &minimal_file(), Path::new("/work")).unwrap();
        assert_eq!(settings.content_dir, Path::new("/srv/site/content"));
    }

    #[test]
    fn yaml_file_is_loaded() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        fs::write(
            &path,
            "notion_token: secret\nnotion_url: https://www.notion.so/Blog-abc\nfront_matter: true\ns3_images: true\n",
        )
        .unwrap();

        let config = load_file_config(&path).unwrap();
        assert_eq!(config.notion_token.as_deref(), Some("secret"));
        assert_eq!(config.front_matter, Some(true));
        assert_eq!(config.s3_images, Some(true));
    }

    #[test]
    fn missing_or_unknown_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(
            load_file_config(&temp.path().join("absent.yml")).unwrap(),
            FileConfig::default()
        );

        let path = temp.path().join("typo.yml");
        fs::write(&path, "notion_tokn: secret\n").unwrap();
        assert!(load_file_config(&path).is_err());
    }
}
