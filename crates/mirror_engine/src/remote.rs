use std::collections::HashSet;

use crate::{ChildrenPage, RemoteNode};

/// Largest page size the remote listing accepts.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("invalid node id or url: {0}")]
    InvalidId(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("http status {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Access to the remote page tree.
#[async_trait::async_trait]
pub trait RemoteTree: Send + Sync {
    /// Returns one page of the immediate children of `node_id`.
    async fn children(
        &self,
        node_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<ChildrenPage, RemoteError>;
}

/// Follows the cursor until the listing is exhausted.
///
/// A cursor that was already followed is rejected instead of looping.
pub async fn list_all_children(
    remote: &dyn RemoteTree,
    node_id: &str,
    page_size: usize,
) -> Result<Vec<RemoteNode>, RemoteError> {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut nodes = Vec::new();
    let mut cursor: Option<String> = None;
    let mut followed: HashSet<String> = HashSet::new();
    loop {
        let page = remote
            .children(node_id, page_size, cursor.as_deref())
            .await?;
        nodes.extend(page.nodes);
        match page.next_cursor {
            Some(next) if !next.is_empty() => {
                if !followed.insert(next.clone()) {
                    return Err(RemoteError::Decode(format!(
                        "listing of {node_id} repeated cursor {next}"
                    )));
                }
                cursor = Some(next);
            }
            _ => break,
        }
    }
    Ok(nodes)
}
