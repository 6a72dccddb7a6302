//! Notion API adapter: child listing for the reconciler and block-to-markdown
//! conversion of a single page.

mod markdown;

use std::time::Duration;

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_trace};
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::convert::{ContentConverter, ConvertError};
use crate::remote::{RemoteError, RemoteTree, MAX_PAGE_SIZE};
use crate::{ChildrenPage, NodeKind, RemoteNode};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Nested blocks deeper than this are not rendered.
const MAX_BLOCK_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub api_base: String,
    pub token: String,
    pub notion_version: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl NotionSettings {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Extracts the page id from a Notion URL: the last `-` separated fragment of
/// the final path segment (`.../My-Blog-0123abcd` → `0123abcd`).
pub fn page_id_from_url(page_url: &str) -> Result<String, RemoteError> {
    let parsed = Url::parse(page_url).map_err(|err| RemoteError::InvalidId(err.to_string()))?;
    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("");
    let id = last_segment.rsplit('-').next().unwrap_or("");
    if id.is_empty() {
        return Err(RemoteError::InvalidId(format!("no page id in {page_url}")));
    }
    Ok(id.to_string())
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    pub last_edited_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl RawBlock {
    /// The type-specific object, e.g. `block["paragraph"]`.
    pub fn payload(&self) -> Option<&Value> {
        self.fields.get(&self.kind)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BlockNode {
    pub block: RawBlock,
    pub children: Vec<BlockNode>,
}

#[derive(Debug, Deserialize)]
struct BlockList {
    results: Vec<RawBlock>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    settings: NotionSettings,
}

impl NotionClient {
    pub fn new(settings: NotionSettings) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        Ok(Self { http, settings })
    }

    fn children_url(
        &self,
        block_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<Url, RemoteError> {
        let base = self.settings.api_base.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/blocks/{block_id}/children"))
            .map_err(|err| RemoteError::InvalidId(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page_size", &page_size.clamp(1, MAX_PAGE_SIZE).to_string());
            if let Some(cursor) = cursor {
                query.append_pair("start_cursor", cursor);
            }
        }
        Ok(url)
    }

    async fn block_children(
        &self,
        block_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<BlockList, RemoteError> {
        let url = self.children_url(block_id, page_size, cursor)?;
        engine_trace!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.token))
            .header("Notion-Version", &self.settings.notion_version)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_status_error(status.as_u16(), &body));
        }
        serde_json::from_slice(&body).map_err(|err| RemoteError::Decode(err.to_string()))
    }

    async fn all_block_children(&self, block_id: &str) -> Result<Vec<RawBlock>, RemoteError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let list = self
                .block_children(block_id, MAX_PAGE_SIZE, cursor.as_deref())
                .await?;
            blocks.extend(list.results);
            match list.next_cursor {
                Some(next) if list.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blocks)
    }

    /// Fetches the block tree of a page. Child pages and databases are
    /// separate mirror entries and are not descended into.
    fn block_tree<'a>(
        &'a self,
        block_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<BlockNode>, RemoteError>> {
        async move {
            let blocks = self.all_block_children(block_id).await?;
            let mut nodes = Vec::with_capacity(blocks.len());
            for block in blocks {
                let descend = block.has_children
                    && depth < MAX_BLOCK_DEPTH
                    && !matches!(block.kind.as_str(), "child_page" | "child_database");
                let children = if descend {
                    self.block_tree(&block.id, depth + 1).await?
                } else {
                    Vec::new()
                };
                nodes.push(BlockNode { block, children });
            }
            Ok(nodes)
        }
        .boxed()
    }
}

#[async_trait::async_trait]
impl RemoteTree for NotionClient {
    async fn children(
        &self,
        node_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<ChildrenPage, RemoteError> {
        let BlockList {
            results,
            next_cursor,
            has_more,
        } = self.block_children(node_id, page_size, cursor).await?;
        let mut nodes = Vec::new();
        for block in results {
            let kind = match block.kind.as_str() {
                "child_page" => NodeKind::Page,
                "child_database" => NodeKind::Container,
                // Regular content blocks of the root page are not tree nodes.
                _ => continue,
            };
            nodes.push(to_remote_node(block, kind)?);
        }
        engine_debug!("Listed {} child nodes of {}", nodes.len(), node_id);
        Ok(ChildrenPage {
            nodes,
            next_cursor: next_cursor.filter(|_| has_more),
        })
    }
}

#[async_trait::async_trait]
impl ContentConverter for NotionClient {
    async fn to_markup(&self, page_id: &str) -> Result<String, ConvertError> {
        let tree = self
            .block_tree(page_id, 0)
            .await
            .map_err(|err| ConvertError::new(page_id, err.to_string()))?;
        Ok(markdown::render_blocks(&tree))
    }
}

fn to_remote_node(block: RawBlock, kind: NodeKind) -> Result<RemoteNode, RemoteError> {
    let title = block
        .payload()
        .and_then(|p| p.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let last_modified = block
        .last_edited_time
        .ok_or_else(|| RemoteError::Decode(format!("block {} has no last_edited_time", block.id)))?;
    Ok(RemoteNode {
        id: block.id,
        title,
        kind,
        last_modified,
    })
}

fn map_status_error(status: u16, body: &[u8]) -> RemoteError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .map(|err| format!("{}: {}", err.code, err.message))
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    match status {
        401 | 403 => RemoteError::Unauthorized(message),
        _ => RemoteError::HttpStatus { status, message },
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::Timeout(err.to_string());
    }
    RemoteError::Network(err.to_string())
}
