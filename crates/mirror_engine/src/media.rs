use std::io::Write;
use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use futures_util::StreamExt;
use regex::Regex;
use tempfile::NamedTempFile;

use crate::naming::{asset_filename, IMAGES_DIR};

/// Separates caption from alt text inside a marker payload.
pub const ALT_DELIMITER: &str = "|alt:";

static IMAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid image marker regex"));

/// An embedded image marker found in converted markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub caption: String,
    pub alt: String,
    pub url: String,
    /// Byte range of the whole marker in the source text.
    pub span: Range<usize>,
}

pub fn find_asset_references(markdown: &str) -> Vec<AssetReference> {
    IMAGE_MARKER
        .captures_iter(markdown)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let payload = caps.get(1)?.as_str();
            let url = caps.get(2)?.as_str();
            let (caption, alt) = match payload.split_once(ALT_DELIMITER) {
                Some((caption, alt)) => (caption, alt),
                None => (payload, ""),
            };
            Some(AssetReference {
                caption: caption.to_string(),
                alt: alt.to_string(),
                url: url.trim().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Hugo `figure` shortcode pointing at a localized asset.
pub fn figure_directive(src: &str, caption: &str, alt: &str) -> String {
    format!(
        "\n\n{{{{< figure src=\"{src}\" caption=\"{caption}\" alt=\"{alt}\" position=\"center\" captionStyle=\"font-style: italic;\" >}}}}\n\n",
        src = src,
        caption = escape_attr(caption),
        alt = escape_attr(alt),
    )
}

fn escape_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("asset too large (max {max_bytes} bytes)")]
    TooLarge { max_bytes: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        DownloadError::Io(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Downloads `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReqwestAssetDownloader {
    client: reqwest::Client,
    settings: DownloadSettings,
}

impl ReqwestAssetDownloader {
    pub fn new(settings: DownloadSettings) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| DownloadError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }
}

#[async_trait::async_trait]
impl AssetDownloader for ReqwestAssetDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| DownloadError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status.as_u16()));
        }
        let max_bytes = self.settings.max_bytes;
        if response.content_length().is_some_and(|len| len > max_bytes) {
            return Err(DownloadError::TooLarge { max_bytes });
        }

        let dir = dest
            .parent()
            .ok_or_else(|| DownloadError::Io(format!("{} has no parent", dest.display())))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            written += chunk.len() as u64;
            if written > max_bytes {
                return Err(DownloadError::TooLarge { max_bytes });
            }
            tmp.write_all(&chunk)?;
        }
        tmp.flush()?;
        tmp.persist(dest)
            .map_err(|err| DownloadError::Io(err.error.to_string()))?;
        Ok(written)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::Timeout(err.to_string());
    }
    DownloadError::Network(err.to_string())
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    /// When false, markup passes through unchanged (assets hosted elsewhere).
    pub enabled: bool,
    /// Prefix of rewritten asset links, e.g. `/posts`.
    pub base_uri: String,
    /// Skip the download when the target file already exists.
    pub reuse_existing: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_uri: String::new(),
            reuse_existing: false,
        }
    }
}

/// Downloads embedded images next to a page and rewrites their markers.
#[derive(Clone)]
pub struct MediaLocalizer {
    settings: MediaSettings,
    downloader: Arc<dyn AssetDownloader>,
}

impl MediaLocalizer {
    pub fn new(settings: MediaSettings, downloader: Arc<dyn AssetDownloader>) -> Self {
        Self {
            settings,
            downloader,
        }
    }

    /// Rewrites every marker whose asset could be downloaded; failed ones are
    /// left exactly as they were. Downloads run one at a time.
    pub async fn localize(&self, markdown: &str, page_dir: &Path, slug: &str) -> String {
        if !self.settings.enabled {
            return markdown.to_string();
        }
        let references = find_asset_references(markdown);
        if references.is_empty() {
            return markdown.to_string();
        }

        let images_dir = page_dir.join(IMAGES_DIR);
        let mut output = String::with_capacity(markdown.len());
        let mut cursor = 0;
        for reference in references {
            output.push_str(&markdown[cursor..reference.span.start]);
            match self.localize_one(&reference, &images_dir, slug).await {
                Some(directive) => output.push_str(&directive),
                None => output.push_str(&markdown[reference.span.clone()]),
            }
            cursor = reference.span.end;
        }
        output.push_str(&markdown[cursor..]);
        output
    }

    async fn localize_one(
        &self,
        reference: &AssetReference,
        images_dir: &Path,
        slug: &str,
    ) -> Option<String> {
        let filename = asset_filename(&reference.url);
        let dest = images_dir.join(&filename);

        if self.settings.reuse_existing && dest.is_file() {
            engine_debug!("Reusing existing asset {:?}", dest);
        } else {
            match self.downloader.download(&reference.url, &dest).await {
                Ok(bytes) => engine_debug!("Downloaded {} bytes to {:?}", bytes, dest),
                Err(err) => {
                    engine_warn!("Keeping remote image {}: {}", reference.url, err);
                    return None;
                }
            }
        }

        let base = self.settings.base_uri.trim_end_matches('/');
        let src = format!("{base}/{slug}/{IMAGES_DIR}/{filename}");
        Some(figure_directive(&src, &reference.caption, &reference.alt))
    }
}
